//! Fixed-width text rendering for logs and the command line.

use super::{Board, CheckerContainer};
use crate::types::Color;

const STACK_HEIGHT: usize = 5;
const TOP_ROW: [u8; 12] = [13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24];
const BOTTOM_ROW: [u8; 12] = [12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1];

impl Board {
    /// Renders the board as text, canonical point 1 at the bottom right.
    ///
    /// `X` is black and `O` is white. Stacks taller than five show their
    /// count on the fifth row.
    pub fn ascii(&self) -> String {
        let mut lines = Vec::new();
        lines.push(self.number_line(&TOP_ROW));
        for level in 0..STACK_HEIGHT {
            lines.push(self.stack_line(&TOP_ROW, level));
        }
        lines.push(format!(
            " {:-<18}+{:-<19} BAR {}:{} {}:{}",
            "",
            "",
            Color::Black.glyph(),
            self.bar_count(Color::Black),
            Color::White.glyph(),
            self.bar_count(Color::White)
        ));
        for level in (0..STACK_HEIGHT).rev() {
            lines.push(self.stack_line(&BOTTOM_ROW, level));
        }
        lines.push(self.number_line(&BOTTOM_ROW));
        lines.push(format!(
            " OFF {}:{} {}:{}  ({} {}, {} {})",
            Color::Black.glyph(),
            self.off_count(Color::Black),
            Color::White.glyph(),
            self.off_count(Color::White),
            Color::Black.glyph(),
            self.direction_of(Color::Black),
            Color::White.glyph(),
            self.direction_of(Color::White),
        ));
        lines.join("\n")
    }

    fn number_line(&self, indices: &[u8; 12]) -> String {
        let (left, right) = indices.split_at(6);
        let render = |half: &[u8]| half.iter().map(|i| format!("{:>3}", i)).collect::<String>();
        format!("{} |{}", render(left), render(right))
    }

    fn stack_line(&self, indices: &[u8; 12], level: usize) -> String {
        let cell = |index: &u8| {
            let Some(point) = self.point(*index) else {
                return "   ".to_string();
            };
            let count = point.count();
            match point.owner() {
                Some(color) if count > level => {
                    if level == STACK_HEIGHT - 1 && count > STACK_HEIGHT {
                        format!("{:>3}", count)
                    } else {
                        format!("{:>3}", color.glyph())
                    }
                }
                _ => "   ".to_string(),
            }
        };
        let (left, right) = indices.split_at(6);
        format!(
            "{} |{}",
            left.iter().map(cell).collect::<String>(),
            right.iter().map(cell).collect::<String>()
        )
    }
}
