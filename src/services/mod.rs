pub(crate) mod access_policy;
pub(crate) mod attempt_windows;
pub(crate) mod notifications;
pub(crate) mod scoring;
pub(crate) mod storage;
