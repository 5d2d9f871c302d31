//! The input side of a volume: a stream of blocks plus a trailing footer.

/// One chunk of plaintext to be fed into a volume's cipher sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// The block's bytes.
    pub data: Vec<u8>,
}

impl Block {
    /// Wraps `data` as a block.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// A source of blocks a volume writer consumes, with one block of lookahead
/// so the writer can decide whether the next block still fits before
/// committing to writing it.
///
/// Grounded on `gpg.py`'s `GPGWriteFile` block_iter contract: `.peek()`
/// returns the next block without consuming it, `.next()` consumes and
/// returns it, and `.get_footer()` returns the trailing bytes (e.g. a tar
/// end-of-archive marker) written once no more blocks will be checked.
pub trait BlockSource {
    /// Returns the next block without consuming it, or `None` if the source
    /// is exhausted.
    fn peek(&mut self) -> Option<&Block>;

    /// Consumes and returns the next block.
    ///
    /// # Panics
    ///
    /// Implementations may panic if called with no block pending — callers
    /// must check [`Self::peek`] first, as [`crate::writer::write_volume`] does.
    fn next_block(&mut self) -> Block;

    /// Bytes to write once the writer has decided to stop pulling blocks.
    fn get_footer(&mut self) -> Vec<u8>;
}

/// A [`BlockSource`] over an in-memory list of blocks, for tests and for
/// callers that have already buffered their blocks.
pub struct VecBlockSource {
    blocks: std::collections::VecDeque<Block>,
    footer: Vec<u8>,
}

impl VecBlockSource {
    /// Builds a source over `blocks`, yielding `footer` once exhausted.
    #[must_use]
    pub fn new(blocks: Vec<Block>, footer: Vec<u8>) -> Self {
        Self {
            blocks: blocks.into(),
            footer,
        }
    }
}

impl BlockSource for VecBlockSource {
    fn peek(&mut self) -> Option<&Block> {
        self.blocks.front()
    }

    fn next_block(&mut self) -> Block {
        self.blocks
            .pop_front()
            .expect("next_block called with no block pending")
    }

    fn get_footer(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.footer)
    }
}
