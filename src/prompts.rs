pub const STAGE_INSTRUCTION: &str = include_str!("../data/prompts/stage_instruction.txt");

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

/// Build the instruction text steering the generative model.
///
/// The fixed three-step directive and the degradation clause never change;
/// only the scene directive varies. Deterministic for a given directive.
pub fn compose(scene_directive: &str) -> String {
    render(STAGE_INSTRUCTION, &[("scene_directive", scene_directive)])
}
