use linelog::{args, Logger, LoggerOptions, LoggerRegistry, SharedBuffer};
use std::sync::Arc;
use std::thread;

fn main() {
    let registry = LoggerRegistry::default();

    // Each channel captures its own output so the results can be compared.
    let buffers: Arc<dashmap::DashMap<String, SharedBuffer>> = Arc::default();
    let captured = Arc::clone(&buffers);
    registry.set_factory(move |name| {
        let out = SharedBuffer::new();
        captured.insert(name.to_string(), out.clone());
        Logger::new(LoggerOptions {
            prefix: name.to_string(),
            no_color: true,
            output: Some(Arc::new(out)),
            ..Default::default()
        })
    });

    thread::scope(|s| {
        for name in ["auth", "billing", "search"] {
            let registry = &registry;
            s.spawn(move || {
                let log = registry.channel(name);
                for i in 0..3 {
                    log.info("tick", args!["n", i]);
                }
            });
        }
    });

    for name in registry.channel_names() {
        if let Some(out) = buffers.get(&name) {
            print!("--- {name} ---\n{}", out.contents());
        }
    }

    registry.default_logger().info("done", args!["channels", buffers.len()]);
}
