//! Master/stack tiling.
//!
//! The first `masters` clients share the left column (or the whole screen
//! when there is nothing left to stack); everything else is stacked
//! vertically in the right half. Pure functions only: the window manager
//! pushes the resulting geometry to the server.

use crate::types::Rect;

/// Compute frame geometries for `count` clients in list order.
///
/// `masters` is clamped to `1..=count`, so this is total over any input.
pub fn master_stack(count: usize, masters: usize, screen: Rect) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }

    let masters = masters.clamp(1, count) as u32;
    let count = count as u32;
    let stacked = count - masters;
    let half = screen.width / 2;

    // No stack column when every client is a master
    let master_width = if stacked == 0 { screen.width } else { half };
    let master_height = screen.height / masters;

    let mut rects = Vec::with_capacity(count as usize);
    for i in 0..masters {
        rects.push(Rect::new(
            screen.x,
            screen.y + (master_height * i) as i32,
            master_width,
            master_height,
        ));
    }

    if stacked > 0 {
        let stack_height = screen.height / stacked;
        for i in 0..stacked {
            rects.push(Rect::new(
                screen.x + half as i32,
                screen.y + (stack_height * i) as i32,
                half,
                stack_height,
            ));
        }
    }

    rects
}

/// Apply `delta` to the master count.
///
/// Returns `None` when the result would leave `1..=clients`; the caller
/// treats that as a no-op.
pub fn adjust_masters(current: usize, delta: isize, clients: usize) -> Option<usize> {
    let target = current.checked_add_signed(delta)?;
    if target < 1 || target > clients {
        return None;
    }
    Some(target)
}

/// Bring `masters` back into `1..=max(1, clients)` after clients went away.
pub fn clamp_masters(masters: usize, clients: usize) -> usize {
    masters.clamp(1, clients.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Rect {
        Rect::new(0, 0, 1920, 1080)
    }

    #[test]
    fn test_no_clients_no_geometry() {
        assert!(master_stack(0, 1, screen()).is_empty());
    }

    #[test]
    fn test_single_client_fills_screen() {
        assert_eq!(master_stack(1, 1, screen()), vec![Rect::new(0, 0, 1920, 1080)]);
    }

    #[test]
    fn test_two_clients_split_in_half() {
        assert_eq!(
            master_stack(2, 1, screen()),
            vec![Rect::new(0, 0, 960, 1080), Rect::new(960, 0, 960, 1080)]
        );
    }

    #[test]
    fn test_three_clients_stack_on_right() {
        assert_eq!(
            master_stack(3, 1, screen()),
            vec![
                Rect::new(0, 0, 960, 1080),
                Rect::new(960, 0, 960, 540),
                Rect::new(960, 540, 960, 540),
            ]
        );
    }

    #[test]
    fn test_all_masters_use_full_width() {
        assert_eq!(
            master_stack(2, 2, screen()),
            vec![Rect::new(0, 0, 1920, 540), Rect::new(0, 540, 1920, 540)]
        );
    }

    #[test]
    fn test_two_masters_with_stack() {
        assert_eq!(
            master_stack(4, 2, screen()),
            vec![
                Rect::new(0, 0, 960, 540),
                Rect::new(0, 540, 960, 540),
                Rect::new(960, 0, 960, 540),
                Rect::new(960, 540, 960, 540),
            ]
        );
    }

    #[test]
    fn test_excess_masters_are_clamped() {
        assert_eq!(master_stack(2, 5, screen()), master_stack(2, 2, screen()));
        assert_eq!(master_stack(2, 0, screen()), master_stack(2, 1, screen()));
    }

    #[test]
    fn test_integer_division_on_odd_sizes() {
        let rects = master_stack(4, 1, Rect::new(0, 0, 1001, 1000));
        assert_eq!(rects[0], Rect::new(0, 0, 500, 1000));
        assert_eq!(rects[1], Rect::new(500, 0, 500, 333));
        assert_eq!(rects[3], Rect::new(500, 666, 500, 333));
    }

    #[test]
    fn test_adjust_masters_bounds() {
        assert_eq!(adjust_masters(1, 1, 3), Some(2));
        assert_eq!(adjust_masters(3, 1, 3), None);
        assert_eq!(adjust_masters(2, -1, 3), Some(1));
        assert_eq!(adjust_masters(1, -1, 3), None);
        assert_eq!(adjust_masters(1, 1, 0), None);
        assert_eq!(adjust_masters(1, -1, 0), None);
    }

    #[test]
    fn test_masters_stay_in_range_under_any_sequence() {
        let clients = 4;
        let mut masters = 1;
        let deltas = [1, 1, 1, 1, 1, -1, -1, -1, -1, -1, -1, 1, -1, 1, 1];
        for delta in deltas {
            if let Some(m) = adjust_masters(masters, delta, clients) {
                masters = m;
            }
            assert!((1..=clients).contains(&masters));
        }
    }

    #[test]
    fn test_clamp_masters() {
        assert_eq!(clamp_masters(3, 2), 2);
        assert_eq!(clamp_masters(3, 0), 1);
        assert_eq!(clamp_masters(1, 5), 1);
    }
}
