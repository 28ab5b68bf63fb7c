/// Sidebar history panel.
///
/// A read-only projection of the backend's bucketed history. Sections are
/// rebuilt wholesale on every load; at most one entry carries the active mark.
use std::time::Duration;

use crate::api::{ArticleId, HistoryEntry, HistoryGroups};
use crate::timer::{Scheduler, TimerHandle, TimerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Today,
    Week,
    Older,
}

impl Bucket {
    pub fn title(self) -> &'static str {
        match self {
            Bucket::Today => "Today",
            Bucket::Week => "Previous 7 Days",
            Bucket::Older => "Older",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub entry: HistoryEntry,
    /// Removal transition running
    pub leaving: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySection {
    pub bucket: Bucket,
    pub entries: Vec<PanelEntry>,
}

pub struct HistoryPanel {
    sections: Vec<HistorySection>,
    active: Option<ArticleId>,
    selected: usize,
    fade: Duration,
    fades: Vec<(ArticleId, TimerHandle)>,
}

impl HistoryPanel {
    pub fn new(fade: Duration) -> Self {
        Self {
            sections: Vec::new(),
            active: None,
            selected: 0,
            fade,
            fades: Vec::new(),
        }
    }

    /// Replace everything with `groups`. Empty buckets get no section.
    pub fn rebuild(&mut self, groups: HistoryGroups) {
        self.fades.clear();
        self.active = None;
        self.sections = [
            (Bucket::Today, groups.today),
            (Bucket::Week, groups.week),
            (Bucket::Older, groups.older),
        ]
        .into_iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(bucket, entries)| HistorySection {
            bucket,
            entries: entries
                .into_iter()
                .map(|entry| PanelEntry { entry, leaving: false })
                .collect(),
        })
        .collect();
        self.clamp_selection();
    }

    pub fn sections(&self) -> &[HistorySection] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ArticleId) -> bool {
        self.entries().any(|e| e.entry.id == id)
    }

    /// Entries in display order.
    pub fn entries(&self) -> impl Iterator<Item = &PanelEntry> {
        self.sections.iter().flat_map(|s| s.entries.iter())
    }

    // ── Active mark ───────────────────────────────────────────────────────────

    /// Mark `id` as the only active entry; `None` or an unknown id clears the mark.
    pub fn mark_active(&mut self, id: Option<ArticleId>) {
        self.active = id.filter(|id| self.contains(*id));
    }

    pub fn active(&self) -> Option<ArticleId> {
        self.active
    }

    // ── Removal ───────────────────────────────────────────────────────────────

    /// Start the removal transition for `id`.
    pub fn begin_remove(&mut self, id: ArticleId, scheduler: &dyn Scheduler) {
        let Some(item) = self
            .sections
            .iter_mut()
            .flat_map(|s| s.entries.iter_mut())
            .find(|e| e.entry.id == id && !e.leaving)
        else {
            return;
        };
        item.leaving = true;
        self.fades
            .push((id, scheduler.after(TimerKind::Fade(id), self.fade)));
    }

    /// Drop a leaving entry, and its section if that was the last entry.
    /// Returns false when `id` was not mid-removal.
    pub fn finish_remove(&mut self, id: ArticleId) -> bool {
        self.fades.retain(|(fid, _)| *fid != id);
        let mut removed = false;
        for section in &mut self.sections {
            let before = section.entries.len();
            section.entries.retain(|e| !(e.entry.id == id && e.leaving));
            removed |= section.entries.len() != before;
        }
        if !removed {
            return false;
        }
        self.sections.retain(|s| !s.entries.is_empty());
        if self.active == Some(id) {
            self.active = None;
        }
        self.clamp_selection();
        true
    }

    // ── Cursor ────────────────────────────────────────────────────────────────

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_entry(&self) -> Option<&HistoryEntry> {
        self.entries().nth(self.selected).map(|e| &e.entry)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.len().saturating_sub(1));
    }
}
