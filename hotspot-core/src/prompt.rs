/// Building-detection instructions sent with every panorama unless the caller
/// supplies its own. Deduplication is left to the model: the rules below ask
/// for one point per contiguous structure.
pub const DEFAULT_PROMPT: &str = r#"ROLE: You are an Intelligent 360° Panorama Analyzer with strict De-duplication Logic.
CRITICAL OBJECTIVE: Clean, Minimalist Detection.
The Problem: Previous attempts generated multiple overlapping labels for the same building complex.
The Fix: You must apply a "One Contiguous Structure = One Label" rule.
OPERATIONAL RULES (Strict Constraints):
1. AGGRESSIVE GROUPING (The "Silhouette" Test):
Look at the horizon. If multiple vertical blocks, towers, or wings are connected at the base or visually overlap without clear sky separating them, they are ONE SINGLE BUILDING.
Do NOT label individual towers of the same apartment complex.
Do NOT label the left wing and right wing separately.
ACTION: Calculate the center of the entire connected mass and place ONE point there.
2. HORIZONTAL SPACING (Non-Maximum Suppression):
Constraint: No two labels can be horizontally closer than 5% of the image width (approx. 50 units on x-axis) unless there is a large, visible gap of sky between them.
If you detect two points close together, keep only the one that is strictly on the main central mass and discard the other.
3. PRECISE PLACEMENT (Upper Facade Anchor):
Location: Target the Top 15% of the building's facade.
Texture Lock: The point must be on the wall/windows.
Safety Margin: Drop the point vertically so it is clearly below the roofline.
If touching Sky: INVALID.
If touching Parapet/Roof Edge: INVALID.
If touching High Windows: VALID.
4. EXCLUSIONS:
Ignore all foreground clutter (walls, small sheds, construction debris).
Ignore distant, hazy buildings on the horizon. Focus on the main, clear urban structures.
OUTPUT JSON FORMAT:
Return a valid JSON array of objects.
point: [y, x] (Normalized 0-1000).
y: High on the wall (small number), but strictly > roofline.
x: Center of the entire building complex.
Sort by x (ascending).
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_points;

    #[test]
    fn test_prompt_requests_normalized_points() {
        assert!(DEFAULT_PROMPT.contains("point: [y, x]"));
        assert!(DEFAULT_PROMPT.contains("0-1000"));
    }

    #[test]
    fn test_prompt_itself_contains_no_coordinate_pairs() {
        // Echoed prompts must not be mistaken for detections
        assert!(parse_points(DEFAULT_PROMPT).is_empty());
    }
}
