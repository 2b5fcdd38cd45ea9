use unicode_segmentation::UnicodeSegmentation;

use crate::models::{Chunk, PageText};

/// Splits page text into overlapping windows of roughly `chunk_size`
/// characters, carrying `overlap` trailing characters into the next window.
/// Windows fill along unicode word boundaries so a word is never split
/// across two chunks. Chunk order follows page order, then in-page order.
pub fn chunk_pages(pages: &[PageText], chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in pages {
        chunk_page(page.page_number, &page.text, chunk_size, chunk_overlap, &mut chunks);
    }
    log::info!("Created {} chunks from {} pages", chunks.len(), pages.len());
    chunks
}

fn chunk_page(
    page_number: u32,
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    out: &mut Vec<Chunk>,
) {
    if text.trim().is_empty() {
        return;
    }
    let chunk_size = chunk_size.max(1);
    // Overlap must leave room for new content or windows stop advancing.
    let overlap = chunk_overlap.min(chunk_size / 2);

    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;
    for segment in text.split_word_bounds() {
        let segment_len = segment.chars().count();
        if current_len + segment_len > chunk_size && has_content(&current) {
            push_chunk(page_number, &current, out);
            // Carry whole trailing segments so the overlap never cuts a
            // word in half.
            let mut carry_len = 0usize;
            let mut keep_from = current.len();
            while keep_from > 0 && carry_len < overlap {
                keep_from -= 1;
                carry_len += current[keep_from].chars().count();
            }
            current.drain(..keep_from);
            current_len = carry_len;
        }
        current.push(segment);
        current_len += segment_len;
    }

    if has_content(&current) {
        push_chunk(page_number, &current, out);
    }
}

fn has_content(segments: &[&str]) -> bool {
    segments.iter().any(|s| !s.trim().is_empty())
}

fn push_chunk(page_number: u32, segments: &[&str], out: &mut Vec<Chunk>) {
    out.push(Chunk {
        page_number,
        text: segments.concat().trim().to_string(),
    });
}
