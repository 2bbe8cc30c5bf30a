//! Star rating for a completed level

/// One star for finishing, two for beating the time limit, three for doing
/// that without losing any shield.
pub fn calculate_stars(total_time: f32, time_limit: u32, shield_percentage: f32) -> u8 {
    let mut stars = 1;
    if total_time <= time_limit as f32 {
        stars += 1;
        if shield_percentage == 100.0 {
            stars += 1;
        }
    }
    stars
}
