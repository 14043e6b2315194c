#![allow(dead_code)]

pub mod molden {
    pub const WATER: &str = "tests/molden/water.mol";
    pub const TRIATOMIC: &str = "tests/molden/triatomic.mol";
    pub const TRUNCATED: &str = "tests/molden/truncated.mol";
    pub const NO_FREQ: &str = "tests/molden/no_freq.mol";
    pub const MISSING: &str = "tests/molden/does_not_exist.mol";
}
