//! Test module organization for the detection service

pub mod property {
    pub mod test_invariants;
}
