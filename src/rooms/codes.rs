//! Room-code minter: fresh 6-character uppercase alphanumeric codes,
//! verified against the store before use.

use rand::Rng;
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::rooms::room_path;
use crate::store::StoreAdapter;

const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LENGTH: usize = 6;

/// Mint a room code that does not name an existing room.
///
/// Draws uniformly over `[A-Z0-9]^6` and probes the store once per draw.
/// The birthday probability at this alphabet and length is negligible for
/// any realistic population; the bounded retry only guards against
/// pathological store state.
pub async fn mint(store: &dyn StoreAdapter, attempts: usize) -> CoreResult<String> {
    for _ in 0..attempts {
        let code = random_code(&mut rand::rng());
        if store.read_once(&room_path(&code)).await?.is_none() {
            return Ok(code);
        }
        debug!(%code, "room code collision; retrying");
    }
    Err(CoreError::CodeExhaustion { attempts })
}

fn random_code(rng: &mut impl Rng) -> String {
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
