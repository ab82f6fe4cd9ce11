use crate::error::ChunkError;
use crate::models::Chunk;
use regex::Regex;

pub const DEFAULT_MAX_CHARS: usize = 1_000;
pub const DEFAULT_OVERLAP_CHARS: usize = 200;

// Boundary patterns in priority order, most preferred first.
const BOUNDARY_PATTERNS: [&str; 11] = [
    r"\n\s*\n\s*\n+",     // 3+ line breaks, hard section break
    r"\n\s*\n+",          // 2+ line breaks, paragraph break
    r"\n-+\n",            // horizontal rule (e.g. '-----')
    r"\n\s*#.+\n",        // heading line (e.g. '# Heading')
    r"\n\s*\*\s*\n",      // bullet separator line ('*')
    r"\n\s*\d+\.\s+",     // numbered list item (e.g. '1. ')
    r"\n\s*•\s*\n",       // bullet separator line (unicode)
    r"\n\s*\|\s*\n",      // table row separator (pipe)
    r"\n\s*\t+\n",        // tab-delimited section break
    r"\n\s*\n?\s*-\s*\n", // single dash line
    r"\n",                // single line break, least preferred
];

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap_chars: DEFAULT_OVERLAP_CHARS,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ChunkError> {
        if self.max_chars == 0 {
            return Err(ChunkError::InvalidConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }
        if self.overlap_chars >= self.max_chars {
            return Err(ChunkError::InvalidConfig(format!(
                "overlap_chars {} must be smaller than max_chars {}",
                self.overlap_chars, self.max_chars
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct TextChunker {
    config: ChunkingConfig,
    patterns: Vec<Regex>,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        let patterns = BOUNDARY_PATTERNS
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { config, patterns })
    }

    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>, ChunkError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let pieces = self.split(text);
        let covered: usize = pieces.iter().map(|piece| piece.len()).sum();
        if covered != text.len() {
            return Err(ChunkError::Internal(format!(
                "boundary split covers {covered} of {} bytes",
                text.len()
            )));
        }

        Ok(self.coalesce(&pieces))
    }

    // Each matched separator stays glued to the piece that follows it, so
    // the pieces always concatenate back to the input.
    pub fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut pieces = Vec::new();
        if !text.is_empty() {
            self.split_from(text, 0, &mut pieces);
        }
        pieces
    }

    fn split_from<'a>(&self, text: &'a str, first_pattern: usize, out: &mut Vec<&'a str>) {
        for (offset, pattern) in self.patterns[first_pattern..].iter().enumerate() {
            let pieces = split_at_matches(pattern, text);
            if pieces.len() < 2 {
                continue;
            }

            let next_pattern = first_pattern + offset + 1;
            for piece in pieces {
                if char_len(piece) > self.config.max_chars && next_pattern < self.patterns.len() {
                    self.split_from(piece, next_pattern, out);
                } else {
                    out.push(piece);
                }
            }
            return;
        }

        out.push(text);
    }

    fn coalesce(&self, pieces: &[&str]) -> Vec<Chunk> {
        let max = self.config.max_chars;
        let mut built: Vec<(String, usize)> = Vec::new();
        let mut current = String::new();
        let mut current_chars = 0usize;
        let mut current_overlap = 0usize;

        for &piece in pieces {
            let piece_chars = char_len(piece);

            // An unsplittable unit over the budget passes through verbatim.
            if piece_chars > max {
                if !current.is_empty() {
                    built.push((current.clone(), current_overlap));
                    current.clear();
                    current_chars = 0;
                    current_overlap = 0;
                }
                built.push((piece.to_string(), 0));
                continue;
            }

            if !current.is_empty() && current_chars + piece_chars > max {
                built.push((current.clone(), current_overlap));
                current.clear();
                current_chars = 0;
                current_overlap = 0;
            }

            // A fresh chunk starts with the tail of the previous one, clamped
            // so the overlap never pushes the chunk past the size budget.
            if current.is_empty() {
                if let Some((previous, _)) = built.last() {
                    let carry = self.config.overlap_chars.min(max - piece_chars);
                    let tail = tail_chars(previous, carry);
                    current_overlap = char_len(tail);
                    current_chars = current_overlap;
                    current.push_str(tail);
                }
            }

            current.push_str(piece);
            current_chars += piece_chars;
        }

        if !current.is_empty() {
            built.push((current, current_overlap));
        }

        built
            .into_iter()
            .enumerate()
            .map(|(ordinal, (text, overlap))| Chunk {
                ordinal,
                text,
                overlap,
            })
            .collect()
    }
}

fn split_at_matches<'a>(pattern: &Regex, text: &'a str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for found in pattern.find_iter(text) {
        if found.start() > start {
            pieces.push(&text[start..found.start()]);
            start = found.start();
        }
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn tail_chars(text: &str, count: usize) -> &str {
    if count == 0 {
        return "";
    }
    let total = char_len(text);
    if count >= total {
        return text;
    }
    match text.char_indices().nth(total - count) {
        Some((offset, _)) => &text[offset..],
        None => text,
    }
}
