//! Range-keyed decorations.
//!
//! Decorations annotate rune ranges with rendering hints (background,
//! squiggle, strikethrough, underline) without touching the document text.
//! Each decoration carries a source tag so plugins can replace their own
//! layer without disturbing others, and a priority that orders overlapping
//! decorations for the renderer.

use std::collections::HashSet;

/// A packed RGBA color (`0xRRGGBBAA`). The core never interprets colors; it
/// only carries them to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color(pub u32);

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    pub fn is_set(&self) -> bool {
        self.0 != 0
    }
}

/// One decoration over the rune range `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    /// Tag identifying the plugin or subsystem that owns this decoration.
    pub source: String,
    pub start: usize,
    pub end: usize,
    /// Higher priorities render on top of lower ones.
    pub priority: i32,
    pub background: Option<Color>,
    pub squiggle: Option<Color>,
    pub strikethrough: Option<Color>,
    pub underline: Option<Color>,
}

impl Decoration {
    /// A background decoration, the most common kind.
    pub fn background(source: &str, start: usize, end: usize, color: Color) -> Self {
        Self {
            source: source.to_string(),
            start,
            end,
            priority: 0,
            background: Some(color),
            squiggle: None,
            strikethrough: None,
            underline: None,
        }
    }

    /// A squiggle (diagnostic underline) decoration.
    pub fn squiggle(source: &str, start: usize, end: usize, color: Color) -> Self {
        Self {
            squiggle: Some(color),
            ..Self::background(source, start, end, Color::default())
        }
        .without_background()
    }

    fn without_background(mut self) -> Self {
        self.background = None;
        self
    }
}

/// Store of decorations keyed by range and source tag.
#[derive(Debug, Default)]
pub struct DecorationStore {
    items: Vec<Decoration>,
}

impl DecorationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add decorations, clipping each range to `doc_len` and dropping those
    /// that fall entirely outside. Returns how many were kept.
    pub fn add(&mut self, doc_len: usize, decorations: impl IntoIterator<Item = Decoration>) -> usize {
        let mut kept = 0;
        for mut deco in decorations {
            deco.end = deco.end.min(doc_len);
            if deco.start >= deco.end {
                continue;
            }
            self.items.push(deco);
            kept += 1;
        }
        self.items.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then_with(|| a.priority.cmp(&b.priority))
        });
        kept
    }

    /// Remove every decoration with the given source tag.
    pub fn clear_source(&mut self, source: &str) {
        self.items.retain(|d| d.source != source);
    }

    /// Remove everything.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Remove decorations from `source` that exactly match `[start, end)`.
    pub fn remove(&mut self, source: &str, start: usize, end: usize) {
        self.items
            .retain(|d| !(d.source == source && d.start == start && d.end == end));
    }

    pub fn all(&self) -> &[Decoration] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All source tags currently present.
    pub fn sources(&self) -> HashSet<&str> {
        self.items.iter().map(|d| d.source.as_str()).collect()
    }

    /// Decorations overlapping `[start, end)`, ordered by start then
    /// priority.
    pub fn query_range(&self, start: usize, end: usize) -> impl Iterator<Item = &Decoration> {
        self.items
            .iter()
            .filter(move |d| d.start < end && d.end > start)
    }

    /// Track a document edit replacing `[start, old_end)` with `new_len`
    /// runes: decorations after the edit shift, decorations overlapping the
    /// replaced span are discarded.
    pub fn on_edit(&mut self, start: usize, old_end: usize, new_len: usize) {
        let old_len = old_end - start;
        self.items.retain_mut(|deco| {
            if deco.end <= start {
                return true;
            }
            if old_len == 0 {
                // Pure insertion: ranges after the point shift, a range
                // spanning the point grows.
                if deco.start >= start {
                    deco.start += new_len;
                    deco.end += new_len;
                } else {
                    deco.end += new_len;
                }
                return true;
            }
            if deco.start >= old_end {
                deco.start = deco.start + new_len - old_len;
                deco.end = deco.end + new_len - old_len;
                return true;
            }
            // The decorated span was (partially) replaced.
            false
        });
    }

    /// Drop or clip decorations that no longer fit the document.
    pub fn clip_to(&mut self, doc_len: usize) {
        self.items.retain_mut(|deco| {
            deco.end = deco.end.min(doc_len);
            deco.start < deco.end
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deco(source: &str, start: usize, end: usize) -> Decoration {
        Decoration::background(source, start, end, Color::rgba(0xdd, 0xdd, 0xdd, 0x80))
    }

    #[test]
    fn test_add_clips_and_drops() {
        let mut store = DecorationStore::new();
        let kept = store.add(10, vec![deco("a", 0, 5), deco("a", 8, 20), deco("a", 12, 15)]);
        assert_eq!(kept, 2);
        assert_eq!(store.all()[1].end, 10);
    }

    #[test]
    fn test_clear_source_only_touches_own_tag() {
        let mut store = DecorationStore::new();
        store.add(100, vec![deco("a", 0, 5), deco("b", 2, 8), deco("a", 10, 12)]);
        store.clear_source("a");
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.all()[0].source, "b");
    }

    #[test]
    fn test_query_range() {
        let mut store = DecorationStore::new();
        store.add(100, vec![deco("a", 0, 5), deco("a", 10, 20), deco("a", 30, 40)]);
        let hits: Vec<_> = store.query_range(4, 12).collect();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_on_edit_shifts_after() {
        let mut store = DecorationStore::new();
        store.add(100, vec![deco("a", 10, 20)]);

        // Insert 3 runes before the decoration.
        store.on_edit(0, 0, 3);
        assert_eq!((store.all()[0].start, store.all()[0].end), (13, 23));

        // Delete 2 runes before it.
        store.on_edit(0, 2, 0);
        assert_eq!((store.all()[0].start, store.all()[0].end), (11, 21));
    }

    #[test]
    fn test_on_edit_grows_spanning_insert() {
        let mut store = DecorationStore::new();
        store.add(100, vec![deco("a", 5, 10)]);
        store.on_edit(7, 7, 2);
        assert_eq!((store.all()[0].start, store.all()[0].end), (5, 12));
    }

    #[test]
    fn test_on_edit_drops_replaced() {
        let mut store = DecorationStore::new();
        store.add(100, vec![deco("a", 5, 10), deco("a", 20, 25)]);
        store.on_edit(8, 12, 1);
        assert_eq!(store.all().len(), 1);
        assert_eq!(store.all()[0].start, 9);
    }

    #[test]
    fn test_priority_ordering() {
        let mut store = DecorationStore::new();
        let mut high = deco("a", 0, 5);
        high.priority = 5;
        store.add(100, vec![high, deco("b", 0, 5)]);
        assert_eq!(store.all()[0].priority, 0);
        assert_eq!(store.all()[1].priority, 5);
    }
}
