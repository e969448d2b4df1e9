use crate::address::HostOccurrence;

/// One buffered input line and the hosts it mentions, in scan order,
/// duplicates included, each carrying the exact byte span it was scanned
/// from for later in-place replacement (§3 "Line record", §4.7).
#[derive(Debug, Clone)]
pub struct LineRecord {
    pub text: String,
    pub hosts: Vec<HostOccurrence>,
}

impl LineRecord {
    pub fn new(text: String, hosts: Vec<HostOccurrence>) -> Self {
        Self { text, hosts }
    }
}
