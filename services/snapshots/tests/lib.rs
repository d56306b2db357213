//! Test module organization for the snapshot access layer

pub mod property {
    pub mod test_invariants;
}
