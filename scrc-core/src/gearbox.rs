//! Automatic gearbox
//!
//! A stateless shift table re-evaluated every tick. The only memory is the
//! gear itself, which the caller keeps in a [`GearState`] between ticks.

use crate::frame::SensorFrame;

/// Reverse gear
pub const REVERSE: i32 = -1;

/// Highest forward gear
pub const TOP_GEAR: i32 = 6;

/// Speed below which a reverse request may engage reverse
const REVERSE_ENGAGE_SPEED: f64 = 1.0;

/// RPM thresholds driving the shift table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftSchedule {
    /// Upshift out of first gear above this RPM
    pub first_upshift_rpm: f64,
    /// Upshift out of gears 2-5 above this RPM
    pub upshift_rpm: f64,
    /// Downshift thresholds for gears 2..=6 (index 0 is gear 2)
    pub downshift_rpm: [f64; 5],
}

impl Default for ShiftSchedule {
    fn default() -> Self {
        Self {
            first_upshift_rpm: 6100.0,
            upshift_rpm: 5800.0,
            downshift_rpm: [2400.0, 2400.0, 3000.0, 3500.0, 4000.0],
        }
    }
}

impl ShiftSchedule {
    /// Next gear for the given speed, RPM and current gear
    ///
    /// Rules are checked in a fixed order and the first match wins. At most
    /// one shift happens per call and the result is never neutral.
    pub fn next_gear(&self, speed: f64, rpm: f64, current_gear: i32, reverse_requested: bool) -> i32 {
        if reverse_requested && speed < REVERSE_ENGAGE_SPEED {
            return REVERSE;
        }
        if current_gear == REVERSE && !reverse_requested {
            return 1;
        }

        let gear = current_gear.clamp(1, TOP_GEAR);

        if gear == 1 && rpm > self.first_upshift_rpm {
            return 2;
        }
        if (2..TOP_GEAR).contains(&gear) && rpm > self.upshift_rpm {
            return gear + 1;
        }
        if gear >= 2 && rpm < self.downshift_rpm[(gear - 2) as usize] {
            return gear - 1;
        }

        gear
    }
}

/// Next gear using the default shift schedule
pub fn next_gear(speed: f64, rpm: f64, current_gear: i32, reverse_requested: bool) -> i32 {
    ShiftSchedule::default().next_gear(speed, rpm, current_gear, reverse_requested)
}

/// Gear carried from one tick to the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GearState {
    pub gear: i32,
}

impl GearState {
    pub fn new(gear: i32) -> Self {
        Self { gear }
    }

    /// Run the shift table against a frame and store the result
    ///
    /// The current gear is read from the frame's `gear` reading; when the
    /// frame lacks one, the previously stored gear is used instead.
    pub fn refresh(&mut self, schedule: &ShiftSchedule, frame: &SensorFrame, reverse_requested: bool) -> i32 {
        let speed = frame.scalar_or_zero("speedX");
        let rpm = frame.scalar_or_zero("rpm");
        let current = frame
            .scalar("gear")
            .map(|g| g as i32)
            .unwrap_or(self.gear);

        self.gear = schedule.next_gear(speed, rpm, current, reverse_requested);
        self.gear
    }

    /// Replace the gear outright (manual override)
    pub fn set(&mut self, gear: i32) {
        self.gear = gear;
    }
}

impl Default for GearState {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_engages_when_slow() {
        assert_eq!(next_gear(0.5, 3000.0, 3, true), REVERSE);
    }

    #[test]
    fn test_reverse_request_ignored_when_fast() {
        assert_eq!(next_gear(20.0, 4000.0, 3, true), 3);
    }

    #[test]
    fn test_leaving_reverse_returns_to_first() {
        for speed in [-10.0, 0.0, 0.5, 30.0] {
            assert_eq!(next_gear(speed, 7000.0, REVERSE, false), 1);
        }
    }

    #[test]
    fn test_reverse_held_while_moving_normalizes_to_first() {
        // Rule order: reverse engage fails on speed, leaving-reverse fails on
        // the request, so the gear is normalized like neutral.
        assert_eq!(next_gear(5.0, 3000.0, REVERSE, true), 1);
    }

    #[test]
    fn test_neutral_normalizes_to_first() {
        assert_eq!(next_gear(0.0, 900.0, 0, false), 1);
        assert_eq!(next_gear(0.0, 6500.0, 0, false), 2);
    }

    #[test]
    fn test_upshift_from_first() {
        assert_eq!(next_gear(40.0, 6200.0, 1, false), 2);
        assert_eq!(next_gear(40.0, 6000.0, 1, false), 1);
    }

    #[test]
    fn test_upshift_mid_gears() {
        for gear in 2..=5 {
            assert_eq!(next_gear(100.0, 5900.0, gear, false), gear + 1);
        }
    }

    #[test]
    fn test_no_upshift_past_top_gear() {
        assert_eq!(next_gear(300.0, 9000.0, 6, false), 6);
    }

    #[test]
    fn test_downshift_thresholds() {
        assert_eq!(next_gear(20.0, 2300.0, 2, false), 1);
        assert_eq!(next_gear(40.0, 2300.0, 3, false), 2);
        assert_eq!(next_gear(80.0, 2900.0, 4, false), 3);
        assert_eq!(next_gear(120.0, 3400.0, 5, false), 4);
        assert_eq!(next_gear(160.0, 3900.0, 6, false), 5);
    }

    #[test]
    fn test_steady_gear() {
        assert_eq!(next_gear(60.0, 4000.0, 3, false), 3);
        assert_eq!(next_gear(160.0, 4500.0, 6, false), 6);
        assert_eq!(next_gear(80.0, 3000.0, 4, false), 4);
    }

    #[test]
    fn test_out_of_range_gear_clamped_to_top() {
        assert_eq!(next_gear(200.0, 4500.0, 9, false), 6);
    }

    #[test]
    fn test_never_neutral_and_single_step() {
        let rpms = [0.0, 1000.0, 2399.0, 2999.0, 3499.0, 3999.0, 5000.0, 5801.0, 6101.0, 12000.0];
        for gear in -1..=6 {
            for &rpm in &rpms {
                for reverse in [false, true] {
                    for speed in [0.0, 0.99, 1.0, 50.0] {
                        let next = next_gear(speed, rpm, gear, reverse);
                        assert_ne!(next, 0, "gear {gear} rpm {rpm} reverse {reverse}");
                        assert!((-1..=TOP_GEAR).contains(&next));
                        if gear >= 1 && next >= 1 {
                            assert!((next - gear).abs() <= 1, "gear {gear} -> {next} at rpm {rpm}");
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_custom_schedule() {
        let schedule = ShiftSchedule {
            first_upshift_rpm: 5000.0,
            ..Default::default()
        };
        assert_eq!(schedule.next_gear(30.0, 5500.0, 1, false), 2);
    }

    #[test]
    fn test_gear_state_refresh_reads_frame() {
        let mut state = GearState::default();
        let frame = SensorFrame::parse("(speedX 80)(rpm 6300)(gear 3)");
        assert_eq!(state.refresh(&ShiftSchedule::default(), &frame, false), 4);
        assert_eq!(state.gear, 4);
    }

    #[test]
    fn test_gear_state_refresh_falls_back_to_stored_gear() {
        let mut state = GearState::new(4);
        let frame = SensorFrame::parse("(speedX 80)(rpm 2900)");
        assert_eq!(state.refresh(&ShiftSchedule::default(), &frame, false), 3);
    }

    #[test]
    fn test_gear_state_refresh_empty_frame() {
        let mut state = GearState::new(1);
        let frame = SensorFrame::parse("garbage");
        assert_eq!(state.refresh(&ShiftSchedule::default(), &frame, false), 1);
    }
}
