use serde::Deserialize;

pub(crate) const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

impl ListQuery {
    pub(crate) fn clamp(&self) -> (i64, i64) {
        let skip = self.skip.max(0);
        let limit = self.limit.clamp(1, 500);
        (skip, limit)
    }
}
