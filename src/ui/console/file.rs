use crate::ui::config::Theme;
use crate::ui::console::print::style::{LineNumberView, MarkerView};
use crate::ui::syntax;
use crate::ui::syntax::StylizedLine;
use lru::LruCache;
use std::cell::RefCell;
use std::io::BufRead;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::{fs, io};
use syntect::util::as_24_bit_terminal_escaped;

const CACHE_SIZE: NonZeroUsize = match NonZeroUsize::new(16) {
    Some(size) => size,
    None => unreachable!(),
};

/// Source file renderer with a cache of recently read files.
pub struct FileView {
    cached_lines: RefCell<LruCache<PathBuf, Rc<[String]>>>,
    theme: Theme,
}

impl FileView {
    pub fn new(theme: Theme) -> Self {
        Self {
            cached_lines: RefCell::new(LruCache::new(CACHE_SIZE)),
            theme,
        }
    }

    fn lines(&self, file_path: &Path) -> io::Result<Rc<[String]>> {
        let mut cache = self.cached_lines.borrow_mut();
        if let Some(lines) = cache.get(file_path) {
            return Ok(lines.clone());
        }

        // invalid utf-8 is replaced, a line is never dropped
        let file = fs::File::open(file_path)?;
        let lines: Rc<[String]> = io::BufReader::new(file)
            .split(b'\n')
            .map(|line| {
                line.map(|mut bytes| {
                    if bytes.last() == Some(&b'\r') {
                        bytes.pop();
                    }
                    String::from_utf8_lossy(&bytes).into_owned()
                })
            })
            .collect::<io::Result<Rc<[String]>>>()?;
        cache.put(file_path.to_path_buf(), lines.clone());
        Ok(lines)
    }

    /// Forget cached file content, next render reads the file again.
    pub fn invalidate(&self, file_path: &Path) {
        self.cached_lines.borrow_mut().pop(file_path);
    }

    /// Render `bounds` lines above and below a 1-based `line`, current line is marked.
    /// Window is clamped by file bounds.
    pub fn render_context(&self, file: &Path, line: u32, bounds: usize) -> anyhow::Result<String> {
        let file_lines = self.lines(file)?;
        let current = (line.max(1) - 1) as usize;
        let start = current.saturating_sub(bounds);
        let end = file_lines.len().min(current + bounds + 1);

        let plain = self.theme == Theme::None;
        let syntax_renderer = syntax::js_syntax_renderer();
        let mut line_renderer = syntax_renderer.line_renderer(self.theme);

        let mut result = String::new();
        for (idx, text) in file_lines.iter().enumerate().take(end).skip(start) {
            let line_number = idx + 1;
            let marker = match (idx == current, plain) {
                (true, true) => ">".to_string(),
                (true, false) => MarkerView::from(">").to_string(),
                (false, _) => " ".to_string(),
            };
            let number = if plain {
                format!("{line_number:>4}")
            } else {
                LineNumberView::from(format!("{line_number:>4}")).to_string()
            };

            match line_renderer.render_line(text)? {
                StylizedLine::NoneStyle(text) => {
                    result.push_str(&format!("{marker} {number} {text}\n"));
                }
                StylizedLine::Stylized(segments) => {
                    let escaped = as_24_bit_terminal_escaped(&segments, false);
                    result.push_str(&format!("{marker} {number} {escaped}\x1b[0m\n"));
                }
            }
        }

        Ok(result)
    }
}
