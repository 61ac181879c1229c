use crate::prelude::*;

pub fn now() -> DateTime {
  Utc::now().naive_utc()
}

/// `%value%` pattern for `LIKE` filters.
pub fn like(value: &str) -> String {
  format!("%{}%", value.trim())
}

pub fn is_blank(value: Option<&str>) -> bool {
  value.is_none_or(|v| v.trim().is_empty())
}

/// Comma separated ids for user facing messages.
pub fn join_ids(ids: &[i32]) -> String {
  ids.iter().map(i32::to_string).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_join_ids() {
    assert_eq!(join_ids(&[]), "");
    assert_eq!(join_ids(&[3, 1, 2]), "3, 1, 2");
  }

  #[test]
  fn test_is_blank() {
    assert!(is_blank(None));
    assert!(is_blank(Some("   ")));
    assert!(!is_blank(Some("ana@club.pt")));
  }

  #[test]
  fn test_like_trims() {
    assert_eq!(like("  ana "), "%ana%");
  }
}
