//! 2D orthographic camera with an interpolated follow goal.
//!
//! `position` is the view centre. Gameplay reasons about the view's bottom-left
//! corner instead (the scroll offset that parallax and HUD placement read), so
//! the follow API takes corners: `move_to` sets a goal corner and `update`
//! closes a fixed fraction of the remaining distance each frame.

use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[derive(Debug, Clone)]
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
    goal: Option<Vec2>,
    follow_speed: f32,
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        let mut camera = Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            viewport: (viewport_width, viewport_height),
            goal: None,
            follow_speed: 1.0,
        };
        camera.snap_bottom_left(Vec2::ZERO);
        camera
    }

    /// Half the visible area in world units.
    pub fn half_extent(&self) -> Vec2 {
        Vec2::new(
            self.viewport.0 as f32 / (2.0 * self.zoom),
            self.viewport.1 as f32 / (2.0 * self.zoom),
        )
    }

    pub fn bottom_left(&self) -> Vec2 {
        self.position - self.half_extent()
    }

    pub fn snap_bottom_left(&mut self, corner: Vec2) {
        self.position = corner + self.half_extent();
        self.goal = None;
    }

    /// Corner that centres `target`, never scrolling past the world origin.
    pub fn follow_corner(&self, target: Vec2) -> Vec2 {
        (target - self.half_extent()).max(Vec2::ZERO)
    }

    pub fn move_to(&mut self, corner: Vec2, speed: f32) {
        self.goal = Some(corner);
        self.follow_speed = speed.clamp(0.0, 1.0);
    }

    pub fn update(&mut self) {
        let Some(goal) = self.goal else {
            return;
        };
        let corner = self.bottom_left().lerp(goal, self.follow_speed);
        self.position = corner + self.half_extent();
    }

    /// World point relative to the view's bottom-left corner (y up).
    pub fn to_view(&self, world: Vec2) -> Vec2 {
        world - self.bottom_left()
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half = self.half_extent();
        let proj = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y - half.y,
            self.position.y + half.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_camera_starts_at_origin_corner() {
        let camera = Camera2D::new(1000, 650);
        assert_eq!(camera.bottom_left(), Vec2::ZERO);
        assert_eq!(camera.position, Vec2::new(500.0, 325.0));
    }

    #[test]
    fn follow_corner_clamps_at_origin() {
        let camera = Camera2D::new(1000, 650);
        assert_eq!(camera.follow_corner(Vec2::new(250.0, 162.5)), Vec2::ZERO);
        assert_eq!(
            camera.follow_corner(Vec2::new(2000.0, 1000.0)),
            Vec2::new(1500.0, 675.0)
        );
    }

    #[test]
    fn update_closes_fraction_of_distance() {
        let mut camera = Camera2D::new(1000, 650);
        camera.move_to(Vec2::new(100.0, 0.0), 0.2);
        camera.update();
        assert!((camera.bottom_left().x - 20.0).abs() < 1e-4);
        camera.update();
        assert!((camera.bottom_left().x - 36.0).abs() < 1e-4);
    }

    #[test]
    fn zoom_shrinks_visible_area() {
        let mut camera = Camera2D::new(2000, 1300);
        camera.zoom = 2.0;
        assert_eq!(camera.half_extent(), Vec2::new(500.0, 325.0));
    }

    #[test]
    fn to_view_is_relative_to_corner() {
        let mut camera = Camera2D::new(1000, 650);
        camera.snap_bottom_left(Vec2::new(300.0, 0.0));
        assert_eq!(camera.to_view(Vec2::new(310.0, 10.0)), Vec2::new(10.0, 10.0));
    }
}
