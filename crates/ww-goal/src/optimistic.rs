// optimistic.rs — Tentative in-memory changes with an explicit snapshot.
//
// `apply` changes the state immediately and hands back the pre-change
// `Snapshot`. The caller then either `commit`s (drops the snapshot) once the
// writes succeed, or `rollback`s to it if they fail.

/// The state as it was before an `apply`.
#[derive(Debug, Clone)]
#[must_use = "a snapshot must be committed or rolled back"]
pub struct Snapshot<T>(T);

impl<T> Snapshot<T> {
    pub fn state(&self) -> &T {
        &self.0
    }
}

#[derive(Debug, Default)]
pub struct Optimistic<T> {
    current: T,
}

impl<T: Clone> Optimistic<T> {
    pub fn new(state: T) -> Self {
        Self { current: state }
    }

    pub fn get(&self) -> &T {
        &self.current
    }

    /// Mutate outside of any tentative change (e.g. after a confirmed read).
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.current
    }

    /// Apply `tentative` now and return the state it replaced.
    pub fn apply(&mut self, tentative: impl FnOnce(&mut T)) -> Snapshot<T> {
        let snapshot = Snapshot(self.current.clone());
        tentative(&mut self.current);
        snapshot
    }

    /// Keep the tentative state.
    pub fn commit(&mut self, snapshot: Snapshot<T>) {
        drop(snapshot);
    }

    /// Restore the state captured by `snapshot`.
    pub fn rollback(&mut self, snapshot: Snapshot<T>) {
        self.current = snapshot.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_restores_snapshot() {
        let mut state = Optimistic::new(vec![1, 2]);
        let snapshot = state.apply(|v| v.push(3));
        assert_eq!(state.get(), &vec![1, 2, 3]);
        assert_eq!(snapshot.state(), &vec![1, 2]);
        state.rollback(snapshot);
        assert_eq!(state.get(), &vec![1, 2]);
    }

    #[test]
    fn commit_keeps_tentative_state() {
        let mut state = Optimistic::new(String::from("a"));
        let snapshot = state.apply(|s| s.push('b'));
        state.commit(snapshot);
        assert_eq!(state.get(), "ab");
    }
}
