// audio capture configuration
pub const DEVICE_INDEX: usize = 2;
pub const SAMP_RATE: u32 = 44800;

// analysis block: 2^11 bytes of 16-bit mono PCM
pub const BLOCK_BYTES: usize = 2048;
pub const BLOCK_LEN: usize = BLOCK_BYTES / 2;

// the capture ring keeps at most two blocks; older data is discarded
pub const RING_CAPACITY: usize = 2 * BLOCK_BYTES;

// LED configuration
pub const PIXEL_COUNT: usize = 300;
pub const FPS: u64 = 30;

// serial link configuration
pub const PORT_NAME: &str = "/dev/ttyUSB0";
pub const BAUD_RATE: u32 = 2_400_000;
pub const WRITE_TIMEOUT_MS: u64 = 100;

// gradient endpoints in "#RRGGBB" form
pub const LOW_COLOR: &str = "#000018";
pub const HIGH_COLOR: &str = "#E00030";
