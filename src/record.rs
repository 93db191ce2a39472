use crate::attr::{Arg, ArgParser, Attr};
use crate::level::Level;
use chrono::{DateTime, FixedOffset};

/// Number of attributes stored inline, without heap allocation. Most log
/// calls carry no more than this.
pub const INLINE_ATTRS: usize = 5;

/// One log event: time, level, message, prefix and attributes.
///
/// Attributes fill a fixed inline array first and spill into an owned
/// overflow vector after that. A `Record` is never implicitly copied;
/// [`Clone`] gives a fully independent record, so appending to a clone
/// cannot disturb the original.
///
/// Do not modify a record after handing it to a [`Handler`](crate::handler::Handler).
#[derive(Clone, Debug)]
pub struct Record {
    /// When the event happened. `None` is the zero time and is not rendered.
    pub time: Option<DateTime<FixedOffset>>,
    pub level: Level,
    pub message: String,
    pub prefix: String,

    // Invariants:
    //   - back is non-empty only if n_front == INLINE_ATTRS
    //   - front[n_front..] are empty attributes
    front: [Attr; INLINE_ATTRS],
    n_front: usize,
    back: Vec<Attr>,
}

impl Record {
    /// Creates a record with no attributes.
    pub fn new(
        time: Option<DateTime<FixedOffset>>,
        level: Level,
        message: impl Into<String>,
    ) -> Self {
        Record {
            time,
            level,
            message: message.into(),
            prefix: String::new(),
            front: Default::default(),
            n_front: 0,
            back: Vec::new(),
        }
    }

    pub fn num_attrs(&self) -> usize {
        self.n_front + self.back.len()
    }

    /// Calls `f` on each attribute in order; stops when `f` returns `false`.
    pub fn attrs(&self, mut f: impl FnMut(&Attr) -> bool) {
        for a in self.iter() {
            if !f(a) {
                return;
            }
        }
    }

    /// Iterates the attributes, inline ones first.
    pub fn iter(&self) -> impl Iterator<Item = &Attr> + '_ {
        self.front[..self.n_front].iter().chain(self.back.iter())
    }

    /// Appends attributes, skipping empty groups.
    pub fn add_attrs(&mut self, attrs: impl IntoIterator<Item = Attr>) {
        let mut attrs = attrs.into_iter();
        while self.n_front < INLINE_ATTRS {
            let Some(a) = attrs.next() else {
                return;
            };
            self.push_front(a);
        }
        let (lo, _) = attrs.size_hint();
        self.back.reserve(lo);
        self.back.extend(attrs.filter(|a| !a.value.is_empty_group()));
    }

    /// Appends attributes given as a flexible argument list (see
    /// [`ArgParser`]), skipping empty groups.
    pub fn add(&mut self, args: impl IntoIterator<Item = Arg>) {
        self.add_attrs(ArgParser::new(args));
    }

    fn push_front(&mut self, a: Attr) {
        if a.value.is_empty_group() {
            return;
        }
        debug_assert!(self.front[self.n_front].is_empty());
        self.front[self.n_front] = a;
        self.n_front += 1;
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Attr;
    type IntoIter = std::iter::Chain<std::slice::Iter<'a, Attr>, std::slice::Iter<'a, Attr>>;

    fn into_iter(self) -> Self::IntoIter {
        self.front[..self.n_front].iter().chain(self.back.iter())
    }
}
