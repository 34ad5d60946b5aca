use ndarray::{Array2, s};
use tracing::debug;

use crate::types::PixelGrid;

/// Intensity used for narrow-page deficit columns (black, before any dark-mode inversion).
pub const PAD_VALUE: f64 = 0.0;

/// Add `left` and `right` constant columns around `grid`.
pub fn pad_columns(grid: &PixelGrid, left: usize, right: usize, value: f64) -> PixelGrid {
    if left == 0 && right == 0 {
        return grid.clone();
    }
    let (rows, cols) = grid.dim();
    let padded_cols = cols + left + right;

    debug!(
        "Adding padding: cols={}, rows={}, pad_left={}, pad_right={}",
        cols, rows, left, right
    );

    let mut padded = Array2::from_elem((rows, padded_cols), value);
    padded
        .slice_mut(s![.., left..left + cols])
        .assign(grid);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_pad_columns_places_content() {
        let grid = array![[0.5, 0.6], [0.7, 0.8]];
        let padded = pad_columns(&grid, 2, 1, PAD_VALUE);
        assert_eq!(padded.dim(), (2, 5));
        assert_eq!(padded.row(0).to_vec(), vec![0.0, 0.0, 0.5, 0.6, 0.0]);
        assert_eq!(padded.row(1).to_vec(), vec![0.0, 0.0, 0.7, 0.8, 0.0]);
    }

    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn log_output(level: tracing::Level) -> String {
        let buffer = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || Captured(sink.clone()))
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            pad_columns(&array![[0.5]], 1, 1, PAD_VALUE);
        });
        let bytes = buffer.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_padding_logs_only_at_debug() {
        assert!(log_output(tracing::Level::INFO).is_empty());
        assert!(log_output(tracing::Level::DEBUG).contains("Adding padding"));
    }

    #[test]
    fn test_no_padding_is_identity() {
        let grid = array![[0.1, 0.2, 0.3]];
        assert_eq!(pad_columns(&grid, 0, 0, PAD_VALUE), grid);
    }
}
