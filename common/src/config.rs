pub const VERSION: &str = env!("BUILD_VERSION");

// ===== BOX LAYOUT =====

// Box key is the asset id as a big-endian u64
pub const ASSET_ID_SIZE: usize = 8;
// identifiers (1) + reversible flags (1) + irreversible flags (1)
// + metadata hash (32) + last modified round (8) + deprecated by (8)
pub const HEADER_SIZE: usize = 51;
// Max box value size accepted by the AVM
pub const MAX_BOX_SIZE: usize = 32_768;
// Largest body that fits in a single box next to its header
pub const MAX_METADATA_SIZE: usize = MAX_BOX_SIZE - HEADER_SIZE;
// Bodies up to this size are flagged "short" in the identifiers byte
pub const SHORT_METADATA_SIZE: usize = 4_096;

// ===== PAGING =====

// Page size used for hashing the body
pub const PAGE_SIZE: usize = 1_024;
// Page index is hashed as a single byte
pub const MAX_PAGES: usize = MAX_METADATA_SIZE.div_ceil(PAGE_SIZE);

// ===== TRANSPORT =====

// Total size of app call arguments
pub const MAX_APP_ARGS_SIZE: usize = 2_048;
// ABI method selector
pub const METHOD_SELECTOR_SIZE: usize = 4;
// Create call: asset id (8) + reversible (1) + irreversible (1)
// + metadata size (2) + payload length prefix (2)
pub const CREATE_CALL_ARGS_OVERHEAD: usize = 14;
// Max payload bytes carried by a single create or extra-payload call
pub const MAX_PAYLOAD_SIZE: usize =
    MAX_APP_ARGS_SIZE - METHOD_SELECTOR_SIZE - CREATE_CALL_ARGS_OVERHEAD;
// Fixed calls on top of the payload calls: the create call and its MBR payment
pub const FIXED_GROUP_CALLS: usize = 2;

// ===== MINIMUM BALANCE REQUIREMENT =====

// Flat MBR per box, in microAlgo
pub const BOX_FLAT_MBR: u64 = 2_500;
// MBR per byte of box key + value, in microAlgo
pub const BOX_BYTE_MBR: u64 = 400;

// ===== ARC-3 =====

pub const ARC3_NAME: &str = "arc3";
pub const ARC3_NAME_SUFFIX: &str = "@arc3";
pub const ARC3_URL_SUFFIX: &str = "#arc3";

// ===== HASH DOMAINS =====

pub const HEADER_HASH_DOMAIN: &[u8] = b"arc0089/header";
pub const PAGE_HASH_DOMAIN: &[u8] = b"arc0089/page";
pub const METADATA_HASH_DOMAIN: &[u8] = b"arc0089/am";

// ===== ARC-90 =====

pub const ARC90_SCHEME: &str = "algorand://";
pub const ARC90_APP_PATH: &str = "/app/";
pub const ARC90_BOX_QUERY: &str = "?box=";

// Default netauth values per network
pub const MAINNET_NETAUTH: &str = "net:mainnet";
pub const TESTNET_NETAUTH: &str = "net:testnet";
pub const LOCALNET_NETAUTH: &str = "net:localnet";

// Static checks
const _: () = assert!(
    MAX_PAGES <= u8::MAX as usize + 1,
    "Page index must fit in a single byte"
);
const _: () = assert!(
    SHORT_METADATA_SIZE <= MAX_METADATA_SIZE,
    "Short metadata threshold must fit in a box"
);
const _: () = assert!(
    MAX_METADATA_SIZE <= u16::MAX as usize,
    "Metadata size is carried as a u16 call argument"
);
