/// Where a directory entry's payload lives.
///
/// Article entries carry their bytes as a blob inside a cluster; redirect
/// entries carry no bytes at all, only the directory index of the entry
/// they resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// directory index of the entry this one resolves to
    Redirect(u32),
    /// position of the entry's bytes, by cluster and blob number
    Blob { cluster: u32, blob: u32 },
}
