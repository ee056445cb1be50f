use crate::config::ViewportConfig;

/// Forward-only follow camera. Returns the new offset: the camera moves only
/// once the player passes `camera_lead` of the viewport width, and never
/// backwards.
pub fn follow(camera_offset: f32, player_x: f32, viewport: &ViewportConfig) -> f32 {
    let lead = viewport.width * viewport.camera_lead;
    if player_x - camera_offset > lead {
        player_x - lead
    } else {
        camera_offset
    }
}
