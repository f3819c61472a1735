use finquery_core::{FinQueryError, FinQueryResult};

/// Sliding-window parameters. The window advances by
/// `chunk_size - overlap` characters each step, so consecutive chunks
/// share exactly `overlap` characters (except the final chunk, which
/// may be shorter than `chunk_size`).
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl ChunkingConfig {
    /// Create a config, enforcing `0 <= overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> FinQueryResult<Self> {
        if chunk_size == 0 {
            return Err(FinQueryError::Config(
                "chunk_size must be positive".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(FinQueryError::Config(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            overlap: 200,
        }
    }
}

/// Partition `text` into overlapping windows.
///
/// Window *i* spans character positions `[i·(S−O), i·(S−O)+S)`; the
/// walk stops once a window start reaches the end of the text. Windows
/// are produced over `char` positions, never splitting a UTF-8 scalar.
/// Whitespace-only windows are NOT filtered here — the caller decides
/// what to retain.
pub fn window_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let stride = config.chunk_size - config.overlap;

    let mut windows = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + config.chunk_size).min(chars.len());
        windows.push(chars[start..end].iter().collect());
        start += stride;
    }
    windows
}
