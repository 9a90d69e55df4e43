//! View-state machine and pose ingestion.
//!
//! `Monitor` is the single owner of all mutable render state: the canvas
//! buffers, the zoom ratio, the view mode and the last drawn pose. It is
//! mutated only by the render loop thread.

use crate::canvas::{MapCanvas, View};
use crate::geometry::{self, MapGeometry, PixelPoint, Pose};
use image::RgbImage;

/// Zoom step applied per zoom key press
const ZOOM_STEP: f64 = 0.05;

/// Lower clamp for the zoom ratio; keeps the scaled buffers non-empty
pub const MIN_RESIZE_RATIO: f64 = 0.05;

/// Which buffer the render loop presents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    CurrentPosition,
    History,
    Quit,
}

/// Key commands understood by the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    ShowCurrent,
    ShowHistory,
    ResetHistory,
    ZoomIn,
    ZoomOut,
    Quit,
}

/// Outcome of a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// The view mode changed (or was re-selected)
    StateChange(ViewMode),
    /// Buffers may have been redrawn but the mode is unchanged
    NoOp,
}

/// Zoom ratio state; only one step of history is retained
#[derive(Debug, Clone, Copy)]
struct ZoomState {
    current: f64,
    previous: f64,
}

/// Most recently ingested pose with its projected marker points
#[derive(Debug, Clone, Copy)]
struct LastDrawn {
    pose: Pose,
    center: PixelPoint,
    tip: PixelPoint,
}

pub struct Monitor {
    canvas: MapCanvas,
    map: MapGeometry,
    zoom: ZoomState,
    mode: ViewMode,
    last: Option<LastDrawn>,
}

impl Monitor {
    /// Build the monitor around a loaded canvas, scaled to the initial ratio.
    pub fn new(mut canvas: MapCanvas, map: MapGeometry, initial_ratio: f64) -> Self {
        let ratio = initial_ratio.max(MIN_RESIZE_RATIO);
        canvas.rescale(ratio);
        Self {
            canvas,
            map,
            zoom: ZoomState {
                current: ratio,
                previous: ratio,
            },
            mode: ViewMode::CurrentPosition,
            last: None,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn zoom(&self) -> f64 {
        self.zoom.current
    }

    pub fn canvas(&self) -> &MapCanvas {
        &self.canvas
    }

    /// Buffer to present for the current view mode.
    pub fn display_buffer(&self) -> &RgbImage {
        match self.mode {
            ViewMode::CurrentPosition => self.canvas.current(),
            ViewMode::History => self.canvas.history(),
            ViewMode::Quit => self.canvas.current(),
        }
    }

    /// Apply one key command. Once `Quit` has been reached every command is
    /// ignored.
    pub fn handle_key(&mut self, key: KeyCommand) -> KeyAction {
        if self.mode == ViewMode::Quit {
            return KeyAction::NoOp;
        }
        match key {
            KeyCommand::ShowCurrent => {
                self.mode = ViewMode::CurrentPosition;
                KeyAction::StateChange(ViewMode::CurrentPosition)
            }
            KeyCommand::ShowHistory => {
                self.mode = ViewMode::History;
                KeyAction::StateChange(ViewMode::History)
            }
            KeyCommand::ResetHistory => {
                self.reset_history();
                KeyAction::NoOp
            }
            KeyCommand::ZoomIn => {
                self.apply_zoom(ZOOM_STEP);
                KeyAction::NoOp
            }
            KeyCommand::ZoomOut => {
                self.apply_zoom(-ZOOM_STEP);
                KeyAction::NoOp
            }
            KeyCommand::Quit => {
                self.mode = ViewMode::Quit;
                KeyAction::StateChange(ViewMode::Quit)
            }
        }
    }

    /// Accept a pose update. Never fails; pose values are not validated.
    ///
    /// Stores the pose as the last drawn pose, projects it at the current
    /// zoom and draws the marker on both overlays.
    pub fn ingest_pose(&mut self, pose: Pose) {
        if self.mode == ViewMode::Quit {
            return;
        }
        log::info!(
            "Pose: [x] -> {:6.2}, [y] -> {:6.2}, [theta] -> {:6.2}",
            pose.x,
            pose.y,
            pose.theta
        );
        self.draw_pose(pose);
    }

    fn draw_pose(&mut self, pose: Pose) {
        let (center, tip) = geometry::project(
            &pose,
            &self.map,
            self.zoom.current,
            self.canvas.scaled().height(),
        );
        self.canvas.reset_current();
        self.canvas.draw_marker(View::Current, center, tip);
        self.canvas.draw_marker(View::History, center, tip);
        self.last = Some(LastDrawn { pose, center, tip });
    }

    fn apply_zoom(&mut self, step: f64) {
        self.zoom.previous = self.zoom.current;
        self.zoom.current = (self.zoom.current + step).max(MIN_RESIZE_RATIO);
        log::debug!(
            "zoom ratio {:.2} -> {:.2}",
            self.zoom.previous,
            self.zoom.current
        );
        self.canvas.rescale(self.zoom.current);
        if let Some(last) = self.last {
            self.draw_pose(last.pose);
        }
    }

    fn reset_history(&mut self) {
        self.canvas.reset_history();
        if let Some(last) = &self.last {
            self.canvas
                .draw_marker(View::History, last.center, last.tip);
        }
        log::debug!("pose history cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    fn test_monitor() -> Monitor {
        let canvas = MapCanvas::from_image(RgbImage::from_pixel(40, 30, WHITE));
        // Power-of-two resolution keeps the projected centers exact
        let map = MapGeometry {
            resolution: 0.25,
            origin: (0.0, 0.0),
        };
        Monitor::new(canvas, map, 1.0)
    }

    // Poses whose markers land well apart on the 40x30 test map
    fn poses() -> [Pose; 3] {
        [
            Pose::new(2.5, 2.5, 0.0),
            Pose::new(5.0, 3.75, 0.0),
            Pose::new(1.25, 6.25, 0.0),
        ]
    }

    fn center_pixel(pose: &Pose) -> (u32, u32) {
        // resolution 0.25, zoom 1, height 30
        ((pose.x * 4.0) as u32, (30.0 - pose.y * 4.0) as u32)
    }

    #[test]
    fn history_accumulates_markers_current_keeps_only_the_latest() {
        let mut monitor = test_monitor();

        for pose in poses() {
            monitor.ingest_pose(pose);
        }

        for pose in &poses() {
            let (x, y) = center_pixel(pose);
            assert_eq!(*monitor.canvas().history().get_pixel(x, y), RED);
        }
        let (x_first, y_first) = center_pixel(&poses()[0]);
        let (x_last, y_last) = center_pixel(&poses()[2]);
        assert_eq!(*monitor.canvas().current().get_pixel(x_first, y_first), WHITE);
        assert_eq!(*monitor.canvas().current().get_pixel(x_last, y_last), RED);
    }

    #[test]
    fn rescale_clears_history_but_preserves_the_last_pose() {
        let mut monitor = test_monitor();
        for pose in poses() {
            monitor.ingest_pose(pose);
        }

        monitor.handle_key(KeyCommand::ZoomIn);

        // A monitor that only ever saw the last pose renders the same buffers
        let mut expected = test_monitor();
        expected.ingest_pose(poses()[2]);
        expected.handle_key(KeyCommand::ZoomIn);

        assert_eq!(
            monitor.canvas().history().as_raw(),
            expected.canvas().history().as_raw()
        );
        assert_eq!(
            monitor.canvas().current().as_raw(),
            expected.canvas().current().as_raw()
        );
    }

    #[test]
    fn reset_restores_exactly_one_marker() {
        let mut monitor = test_monitor();
        for pose in poses() {
            monitor.ingest_pose(pose);
        }

        let action = monitor.handle_key(KeyCommand::ResetHistory);

        assert_eq!(action, KeyAction::NoOp);
        let mut expected = test_monitor();
        expected.ingest_pose(poses()[2]);
        assert_eq!(
            monitor.canvas().history().as_raw(),
            expected.canvas().history().as_raw()
        );
    }

    #[test]
    fn reset_without_any_pose_yields_a_clean_map() {
        let mut monitor = test_monitor();

        monitor.handle_key(KeyCommand::ResetHistory);

        assert_eq!(
            monitor.canvas().history().as_raw(),
            monitor.canvas().scaled().as_raw()
        );
    }

    #[test]
    fn mode_switch_is_idempotent() {
        let mut monitor = test_monitor();
        monitor.ingest_pose(poses()[0]);

        let first = monitor.handle_key(KeyCommand::ShowCurrent);
        let buffer_after_first = monitor.display_buffer().as_raw().clone();
        let second = monitor.handle_key(KeyCommand::ShowCurrent);

        assert_eq!(first, KeyAction::StateChange(ViewMode::CurrentPosition));
        assert_eq!(second, KeyAction::StateChange(ViewMode::CurrentPosition));
        assert_eq!(*monitor.display_buffer().as_raw(), buffer_after_first);
    }

    #[test]
    fn display_buffer_follows_the_mode() {
        let mut monitor = test_monitor();
        monitor.ingest_pose(poses()[0]);
        monitor.ingest_pose(poses()[1]);

        monitor.handle_key(KeyCommand::ShowHistory);
        let (x_first, y_first) = center_pixel(&poses()[0]);
        assert_eq!(*monitor.display_buffer().get_pixel(x_first, y_first), RED);

        monitor.handle_key(KeyCommand::ShowCurrent);
        assert_eq!(*monitor.display_buffer().get_pixel(x_first, y_first), WHITE);
    }

    #[test]
    fn quit_is_terminal() {
        let mut monitor = test_monitor();
        monitor.ingest_pose(poses()[0]);

        assert_eq!(
            monitor.handle_key(KeyCommand::Quit),
            KeyAction::StateChange(ViewMode::Quit)
        );

        let history_before = monitor.canvas().history().as_raw().clone();
        let current_before = monitor.canvas().current().as_raw().clone();

        assert_eq!(monitor.handle_key(KeyCommand::ShowHistory), KeyAction::NoOp);
        assert_eq!(monitor.handle_key(KeyCommand::ZoomIn), KeyAction::NoOp);
        monitor.ingest_pose(poses()[1]);

        assert_eq!(monitor.mode(), ViewMode::Quit);
        assert_eq!(*monitor.canvas().history().as_raw(), history_before);
        assert_eq!(*monitor.canvas().current().as_raw(), current_before);
    }

    #[test]
    fn zoom_out_clamps_at_the_minimum_ratio() {
        let mut monitor = test_monitor();

        for _ in 0..40 {
            monitor.handle_key(KeyCommand::ZoomOut);
        }

        assert!(monitor.zoom() >= MIN_RESIZE_RATIO);
        assert!(monitor.canvas().scaled().width() >= 1);
    }

    #[test]
    fn zoom_redraws_the_marker_without_a_new_update() {
        let mut monitor = test_monitor();
        let pose = Pose::new(2.5, 2.5, 0.0);
        monitor.ingest_pose(pose);

        monitor.handle_key(KeyCommand::ZoomIn);

        // Recompute the marker center the way the redraw does
        let zoom = monitor.zoom();
        let height = monitor.canvas().scaled().height();
        let x = (pose.x * zoom / 0.25) as u32;
        let y = (f64::from(height) - pose.y / 0.25 * zoom) as u32;
        assert_eq!(*monitor.canvas().current().get_pixel(x, y), RED);
        assert_eq!(*monitor.canvas().history().get_pixel(x, y), RED);
    }
}
