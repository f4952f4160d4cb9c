pub mod service;

pub use service::{
    cancel_scan, delete_files, doctor, get_scan_session, poll_scan_events, remove_scan_session,
    start_scan, take_scan_output, CancelScanResponse, DeleteRequest, DeleteResponse, ScanProgressEvent,
    ScanRequest, ScanSessionSnapshot, ScanSessionStatus,
};
