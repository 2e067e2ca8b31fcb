/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub changed: Vec<std::ops::Range<usize>>,
    pub new_cursor: usize,
    pub version: u64,
}
