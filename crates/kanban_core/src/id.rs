//! Record identifier generation.
//!
//! Ids have the shape `id_<epoch millis>_<9 base-36 chars>`. The timestamp
//! keeps ids roughly creation-ordered; the suffix comes from a v4 UUID.

use chrono::Utc;
use uuid::Uuid;

const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a new record id.
pub fn generate_id() -> String {
    format!(
        "id_{}_{}",
        Utc::now().timestamp_millis(),
        random_suffix(SUFFIX_LEN)
    )
}

fn random_suffix(len: usize) -> String {
    let mut value = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        out.push(BASE36[(value % 36) as usize] as char);
        value /= 36;
    }
    out
}
