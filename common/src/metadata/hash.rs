// ARC-89 metadata hash derivation
//
// header_hash   = H("arc0089/header" || identifiers || reversible || irreversible)
// page_hash_i   = H("arc0089/page" || i || len(page_i) as u16 BE || page_i)
// metadata_hash = H("arc0089/am" || header_hash || page_hash_0 || ... || page_hash_n)
//
// H is SHA-512/256. The header bytes come first, then every page in order.

use crate::config::{HEADER_HASH_DOMAIN, MAX_PAGES, METADATA_HASH_DOMAIN, PAGE_HASH_DOMAIN, PAGE_SIZE};
use crate::crypto::{hash_parts, Hash};
use crate::error::{RegistryError, RegistryResult};

pub fn compute_header_hash(identifiers: u8, reversible: u8, irreversible: u8) -> Hash {
    hash_parts(&[
        HEADER_HASH_DOMAIN,
        &[identifiers, reversible, irreversible],
    ])
}

/// Hash of one page; pages longer than `PAGE_SIZE` are rejected
pub fn compute_page_hash(index: u8, page: &[u8]) -> RegistryResult<Hash> {
    let len = u16::try_from(page.len())
        .ok()
        .filter(|_| page.len() <= PAGE_SIZE)
        .ok_or_else(|| {
            RegistryError::InvalidSize(format!(
                "page {} is {} bytes, maximum is {}",
                index,
                page.len(),
                PAGE_SIZE
            ))
        })?;
    Ok(hash_parts(&[PAGE_HASH_DOMAIN, &[index], &len.to_be_bytes(), page]))
}

/// Compute the metadata hash stored in the header
///
/// Pure and deterministic. Used both when writing a record and when
/// verifying one read back from storage. At most `MAX_PAGES` pages of at
/// most `PAGE_SIZE` bytes each.
pub fn encode_header<P: AsRef<[u8]>>(
    identifiers: u8,
    reversible: u8,
    irreversible: u8,
    pages: &[P],
) -> RegistryResult<Hash> {
    if pages.len() > MAX_PAGES {
        return Err(RegistryError::InvalidSize(format!(
            "{} pages exceed maximum {}",
            pages.len(),
            MAX_PAGES
        )));
    }

    let header_hash = compute_header_hash(identifiers, reversible, irreversible);
    let page_hashes = pages
        .iter()
        .zip(0u8..)
        .map(|(page, i)| compute_page_hash(i, page.as_ref()))
        .collect::<RegistryResult<Vec<Hash>>>()?;

    let mut parts: Vec<&[u8]> = Vec::with_capacity(2 + page_hashes.len());
    parts.push(METADATA_HASH_DOMAIN);
    parts.push(header_hash.as_bytes());
    parts.extend(page_hashes.iter().map(|h| h.as_bytes().as_slice()));
    Ok(hash_parts(&parts))
}
