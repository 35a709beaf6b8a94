/// Staleness token for scheduled scans.
///
/// Each bootstrap bumps the counter; work captured with an older value
/// no-ops when it finally runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanGeneration(u64);

impl ScanGeneration {
    pub fn bump(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub fn current(self) -> u64 {
        self.0
    }

    pub fn is_current(self, token: u64) -> bool {
        self.0 == token
    }
}
