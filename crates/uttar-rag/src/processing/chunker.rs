//! Overlapping window chunker with break-point snapping.

pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_size: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize, min_chunk_size: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            min_chunk_size,
        }
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.len() <= self.chunk_size {
            if text.trim().len() < self.min_chunk_size {
                return Vec::new();
            }
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let raw_end = (start + self.chunk_size).min(text.len());
            let end = snap_to_char_boundary(text, raw_end);

            // Prefer a natural break near the end of the window
            let actual_end = if end < text.len() {
                self.find_break_point(text, start, end)
            } else {
                end
            };

            let chunk_text = &text[start..actual_end];
            if chunk_text.trim().len() >= self.min_chunk_size {
                chunks.push(chunk_text.to_string());
            }

            // Move forward with overlap
            let step = if actual_end - start > self.chunk_overlap {
                actual_end - start - self.chunk_overlap
            } else {
                actual_end - start
            };

            start = snap_to_char_boundary(text, start + step);
            if start >= text.len() {
                break;
            }
        }

        chunks
    }

    fn find_break_point(&self, text: &str, start: usize, preferred_end: usize) -> usize {
        // Search within the window only; small windows search from `start`
        let raw_search_start = if preferred_end > start + 200 {
            preferred_end - 200
        } else {
            start
        };
        let search_start = snap_to_char_boundary(text, raw_search_start);
        let safe_end = snap_to_char_boundary(text, preferred_end);

        if search_start >= safe_end {
            return safe_end;
        }

        let search_region = &text[search_start..safe_end];

        // Priority: paragraph break > sentence end > line break > word break
        if let Some(pos) = search_region.rfind("\n\n") {
            return search_start + pos + 2;
        }
        if let Some(pos) = search_region.rfind(". ") {
            return search_start + pos + 2;
        }
        if let Some(pos) = search_region.rfind(".\n") {
            return search_start + pos + 2;
        }
        if let Some(pos) = search_region.rfind('\n') {
            return search_start + pos + 1;
        }
        if let Some(pos) = search_region.rfind(' ') {
            return search_start + pos + 1;
        }

        safe_end
    }
}

/// Snap a byte offset to the nearest valid UTF-8 char boundary (rounding
/// down). Returns `text.len()` when `pos` is past the end.
fn snap_to_char_boundary(text: &str, pos: usize) -> usize {
    if pos >= text.len() {
        return text.len();
    }
    let mut p = pos;
    while p > 0 && !text.is_char_boundary(p) {
        p -= 1;
    }
    p
}
