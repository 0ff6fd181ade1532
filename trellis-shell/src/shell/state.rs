use std::fmt::Write;

use tracing::warn;

use crate::{
    event::{NavigationPhase, NavigationSource, NavigationState},
    page::{PageId, PageRef},
    shell::ShellConfig,
};

/// Mutable shell state guarded by one lock.
#[derive(Debug)]
pub(crate) struct ShellState {
    pub(crate) stacks: Stacks,
    pub(crate) phase: NavigationPhase,
}

impl ShellState {
    pub(crate) fn new(root: PageRef) -> Self {
        Self {
            stacks: Stacks::new(root),
            phase: NavigationPhase::Idle,
        }
    }
}

/// The main and modal stacks, bottom first.
///
/// The main stack always holds the root page at index 0.
#[derive(Clone, Debug)]
pub(crate) struct Stacks {
    pub(crate) main: Vec<PageRef>,
    pub(crate) modal: Vec<PageRef>,
}

/// One id-keyed stack change.
///
/// Edits are computed against a snapshot and applied to the live stacks at
/// commit time. An edit whose target vanished in between is skipped.
#[derive(Clone, Debug)]
pub(crate) enum StackEdit {
    PushMain(PageRef),
    PushModal(PageRef),
    RemoveMain(PageId),
    RemoveModal(PageId),
    InsertMain { page: PageRef, before: PageId },
}

impl Stacks {
    pub(crate) fn new(root: PageRef) -> Self {
        Self {
            main: vec![root],
            modal: Vec::new(),
        }
    }

    pub(crate) fn root(&self) -> &PageRef {
        &self.main[0]
    }

    pub(crate) fn main_top(&self) -> &PageRef {
        self.main.last().unwrap_or_else(|| self.root())
    }

    /// Top modal page, else top of the main stack.
    pub(crate) fn current_page(&self) -> &PageRef {
        self.modal.last().unwrap_or_else(|| self.main_top())
    }

    /// Whether `id` is presented anywhere, nested pages included.
    pub(crate) fn contains(&self, id: PageId) -> bool {
        self.main
            .iter()
            .chain(self.modal.iter())
            .any(|page| page.contains(id))
    }

    pub(crate) fn main_index(&self, id: PageId) -> Option<usize> {
        self.main.iter().position(|page| page.id() == id)
    }

    /// Index of the modal entry that is, or contains, `id`.
    pub(crate) fn modal_index_containing(&self, id: PageId) -> Option<usize> {
        self.modal.iter().position(|page| page.contains(id))
    }

    pub(crate) fn apply(&mut self, edit: &StackEdit) {
        match edit {
            StackEdit::PushMain(page) => {
                if self.main_index(page.id()).is_none() {
                    self.main.push(page.clone());
                }
            }
            StackEdit::PushModal(page) => {
                if !self.modal.iter().any(|entry| entry.id() == page.id()) {
                    self.modal.push(page.clone());
                }
            }
            StackEdit::RemoveMain(id) => match self.main_index(*id) {
                Some(0) => warn!(page = %id, "refusing to remove the root page"),
                Some(index) => {
                    self.main.remove(index);
                }
                None => {}
            },
            StackEdit::RemoveModal(id) => {
                self.modal.retain(|page| page.id() != *id);
            }
            StackEdit::InsertMain { page, before } => {
                if self.main_index(page.id()).is_some() {
                    return;
                }
                match self.main_index(*before) {
                    Some(index) if index > 0 => self.main.insert(index, page.clone()),
                    _ => warn!(page = %page.id(), before = %before, "insertion anchor vanished"),
                }
            }
        }
    }

    pub(crate) fn apply_all(&mut self, edits: &[StackEdit]) {
        for edit in edits {
            self.apply(edit);
        }
    }

    pub(crate) fn with_edits(&self, edits: &[StackEdit]) -> Self {
        let mut stacks = self.clone();
        stacks.apply_all(edits);
        stacks
    }

    /// Edits turning `self` into `target`, assuming `target` shares a
    /// prefix with `self` on each stack and only adds on top of it.
    pub(crate) fn edits_to(&self, target: &Stacks) -> Vec<StackEdit> {
        let main_common = common_prefix(&self.main, &target.main).max(1);
        let modal_common = common_prefix(&self.modal, &target.modal);

        let mut edits = Vec::new();
        edits.extend(
            self.modal[modal_common..]
                .iter()
                .rev()
                .map(|page| StackEdit::RemoveModal(page.id())),
        );
        edits.extend(
            self.main[main_common..]
                .iter()
                .rev()
                .map(|page| StackEdit::RemoveMain(page.id())),
        );
        edits.extend(
            target.main[main_common..]
                .iter()
                .cloned()
                .map(StackEdit::PushMain),
        );
        edits.extend(
            target.modal[modal_common..]
                .iter()
                .cloned()
                .map(StackEdit::PushModal),
        );
        edits
    }

    pub(crate) fn same_pages(&self, other: &Stacks) -> bool {
        same_ids(&self.main, &other.main) && same_ids(&self.modal, &other.modal)
    }

    /// `//root/main.../modal...`
    pub(crate) fn location(&self, config: &ShellConfig) -> NavigationState {
        let mut location = String::from("/");
        for page in self.main.iter().chain(self.modal.iter()) {
            location.push('/');
            match page.route() {
                Some(route) => location.push_str(route),
                None => {
                    let _ = write!(location, "{}-{}", config.anonymous_route_prefix, page.id());
                }
            }
        }
        NavigationState::new(location)
    }
}

fn common_prefix(a: &[PageRef], b: &[PageRef]) -> usize {
    a.iter()
        .zip(b)
        .take_while(|(a, b)| a.id() == b.id())
        .count()
}

fn same_ids(a: &[PageRef], b: &[PageRef]) -> bool {
    a.len() == b.len() && common_prefix(a, b) == a.len()
}

fn extends(shorter: &[PageRef], longer: &[PageRef]) -> bool {
    shorter.len() <= longer.len() && common_prefix(shorter, longer) == shorter.len()
}

/// Classify a multi-step change by comparing the stacks around it.
pub(crate) fn dominant_source(
    before: &Stacks,
    after: &Stacks,
    config: &ShellConfig,
) -> NavigationSource {
    if before.same_pages(after) {
        return NavigationSource::Unknown;
    }
    let grew = extends(&before.main, &after.main) && extends(&before.modal, &after.modal);
    if grew {
        return NavigationSource::Push;
    }
    let shrank = extends(&after.main, &before.main) && extends(&after.modal, &before.modal);
    if shrank {
        let removed =
            before.main.len() - after.main.len() + before.modal.len() - after.modal.len();
        let at_root = after.main.len() == 1 && after.modal.is_empty();
        // Dismissing the only modal stays a Pop, as with pop_modal.
        let last_main_pop = before.modal.is_empty() && config.pop_to_root_on_last_pop;
        if at_root && (removed > 1 || last_main_pop) {
            return NavigationSource::PopToRoot;
        }
        return NavigationSource::Pop;
    }
    NavigationSource::Unknown
}

#[cfg(test)]
mod tests {
    use crate::{event::NavigationSource, page::Page, shell::ShellConfig};

    use super::{StackEdit, Stacks, dominant_source};

    #[test]
    fn location_lists_routes_and_anonymous_pages() {
        let root = Page::with_route("main");
        let anonymous = Page::new();
        let mut stacks = Stacks::new(root);
        stacks.main.push(Page::with_route("detail"));
        stacks.modal.push(anonymous.clone());

        let config = ShellConfig::default();
        assert_eq!(
            stacks.location(&config).location(),
            format!("//main/detail/page-{}", anonymous.id())
        );
    }

    #[test]
    fn edits_skip_vanished_targets_and_keep_the_root() {
        let root = Page::new();
        let modal = Page::new();
        let mut stacks = Stacks::new(root.clone());
        stacks.modal.push(modal.clone());

        stacks.apply_all(&[
            StackEdit::RemoveModal(modal.id()),
            StackEdit::RemoveModal(modal.id()),
            StackEdit::RemoveMain(root.id()),
            StackEdit::InsertMain {
                page: Page::new(),
                before: root.id(),
            },
        ]);
        assert_eq!(stacks.main.len(), 1);
        assert!(stacks.modal.is_empty());
    }

    #[test]
    fn edits_to_rebuild_the_target() {
        let root = Page::new();
        let a = Page::new();
        let b = Page::new();
        let m = Page::new();
        let mut before = Stacks::new(root.clone());
        before.main.extend([a.clone(), b]);
        before.modal.push(m);

        let mut target = Stacks::new(root);
        target.main.push(a);
        target.main.push(Page::new());

        let rebuilt = before.with_edits(&before.edits_to(&target));
        assert!(rebuilt.same_pages(&target));
    }

    #[test]
    fn dominant_source_classifies_growth_and_shrinkage() {
        let config = ShellConfig::default();
        let root = Page::new();
        let a = Page::new();
        let b = Page::new();
        let base = Stacks::new(root);
        let mut one = base.clone();
        one.main.push(a);
        let mut two = one.clone();
        two.main.push(b.clone());

        assert_eq!(dominant_source(&base, &two, &config), NavigationSource::Push);
        assert_eq!(dominant_source(&two, &one, &config), NavigationSource::Pop);
        assert_eq!(
            dominant_source(&two, &base, &config),
            NavigationSource::PopToRoot
        );
        assert_eq!(
            dominant_source(&one, &base, &config),
            NavigationSource::PopToRoot
        );

        let strict = ShellConfig {
            pop_to_root_on_last_pop: false,
            ..ShellConfig::default()
        };
        assert_eq!(dominant_source(&one, &base, &strict), NavigationSource::Pop);

        let mut presented = base.clone();
        presented.modal.push(Page::new());
        assert_eq!(dominant_source(&presented, &base, &config), NavigationSource::Pop);
        let mut nested = one.clone();
        nested.modal.push(Page::new());
        assert_eq!(
            dominant_source(&nested, &base, &config),
            NavigationSource::PopToRoot
        );

        let mut replaced = one.clone();
        replaced.main[1] = Page::new();
        assert_eq!(
            dominant_source(&one, &replaced, &config),
            NavigationSource::Unknown
        );
    }
}
