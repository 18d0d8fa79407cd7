// crates/drape-rank/src/window.rs
//
// The bounded window of recent positive interactions.

use drape_core::{EmbeddingTable, InteractionEvent};

/// Number of most recent likes that shape the preference vector.
pub const WINDOW_SIZE: usize = 3;

/// Selects the most recent likes and resolves them to embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionWindow {
    size: usize,
}

impl Default for InteractionWindow {
    fn default() -> Self {
        Self { size: WINDOW_SIZE }
    }
}

impl InteractionWindow {
    /// A window of `size` likes. A size of zero is treated as one.
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// The last `size` like events, oldest first. Other actions are ignored.
    pub fn recent_likes<'e>(&self, events: &'e [InteractionEvent]) -> Vec<&'e InteractionEvent> {
        let likes: Vec<&InteractionEvent> = events.iter().filter(|e| e.is_like()).collect();
        let start = likes.len().saturating_sub(self.size);
        likes[start..].to_vec()
    }

    /// Embeddings of the window's likes, oldest first.
    ///
    /// Ids without an embedding are dropped. A vector whose length differs
    /// from the newest resolved vector is dropped with a warning. Returns
    /// `None` when nothing resolves.
    pub fn resolve<'t>(
        &self,
        events: &[InteractionEvent],
        embeddings: &'t EmbeddingTable,
    ) -> Option<Vec<&'t [f32]>> {
        let resolved: Vec<(&str, &'t [f32])> = self
            .recent_likes(events)
            .into_iter()
            .filter_map(|e| {
                embeddings
                    .get(&e.product_id)
                    .map(|v| (e.product_id.as_str(), v))
            })
            .collect();

        let expected = resolved.last()?.1.len();
        let vectors: Vec<&'t [f32]> = resolved
            .into_iter()
            .filter(|(id, v)| {
                if v.len() == expected {
                    true
                } else {
                    tracing::warn!(
                        product_id = %id,
                        expected,
                        found = v.len(),
                        "Dropping liked embedding with mismatched length"
                    );
                    false
                }
            })
            .map(|(_, v)| v)
            .collect();

        Some(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use drape_core::NewEvent;

    fn events(entries: &[(&str, &str)]) -> Vec<InteractionEvent> {
        entries
            .iter()
            .map(|(id, action)| NewEvent::new(*id, *action).at(Utc::now()))
            .collect()
    }

    fn table() -> EmbeddingTable {
        [
            ("a1", vec![1.0, 0.0]),
            ("a2", vec![0.0, 1.0]),
            ("a3", vec![1.0, 1.0]),
            ("a4", vec![-1.0, 0.0]),
        ]
        .into_iter()
        .map(|(id, v)| (id.to_string(), v))
        .collect()
    }

    #[test]
    fn keeps_only_last_three_likes() {
        let log = events(&[
            ("a1", "like"),
            ("a2", "like"),
            ("a9", "view"),
            ("a3", "like"),
            ("a4", "like"),
        ]);
        let window = InteractionWindow::default();
        let ids: Vec<&str> = window
            .recent_likes(&log)
            .iter()
            .map(|e| e.product_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a2", "a3", "a4"]);
    }

    #[test]
    fn unresolvable_likes_are_dropped_not_replaced() {
        // The window is chosen before resolution: "missing" occupies a slot.
        let log = events(&[("a1", "like"), ("a2", "like"), ("missing", "like"), ("a3", "like")]);
        let table = table();
        let vectors = InteractionWindow::default().resolve(&log, &table).unwrap();
        assert_eq!(vectors, vec![&[0.0f32, 1.0][..], &[1.0f32, 1.0][..]]);
    }

    #[test]
    fn no_likes_or_nothing_resolved_is_none() {
        let table = table();
        let window = InteractionWindow::default();
        assert!(window.resolve(&[], &table).is_none());
        assert!(window.resolve(&events(&[("a1", "view")]), &table).is_none());
        assert!(window.resolve(&events(&[("zz", "like")]), &table).is_none());
    }

    #[test]
    fn mismatched_length_is_dropped() {
        let mut table = table();
        table.insert("short", vec![1.0]);
        let log = events(&[("short", "like"), ("a1", "like")]);
        let vectors = InteractionWindow::default().resolve(&log, &table).unwrap();
        assert_eq!(vectors, vec![&[1.0f32, 0.0][..]]);
    }

    #[test]
    fn like_match_is_exact() {
        let log = events(&[("a1", "Like"), ("a2", "likes")]);
        assert!(InteractionWindow::default().resolve(&log, &table()).is_none());
    }
}
