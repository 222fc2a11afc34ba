use sha1::{Digest, Sha1};

use crate::utils::slugify;

pub const SLUG_TITLE_LEN: usize = 40;
pub const SLUG_HASH_LEN: usize = 10;

/// Card file stem: readable title prefix plus a title digest. Depends on the
/// title alone, so reruns and body edits keep the same name.
pub fn card_slug(title: &str) -> String {
    let digest = hex::encode(Sha1::digest(title.as_bytes()));
    format!("{}-{}", slugify(title, SLUG_TITLE_LEN), &digest[..SLUG_HASH_LEN])
}
