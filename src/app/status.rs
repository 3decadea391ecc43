use loopgov::ControlPlane;

pub fn render_status(plane: &ControlPlane) -> String {
    let config = plane.config();
    let mut lines = vec![
        format!("◆ loopgov {}", env!("CARGO_PKG_VERSION")),
        String::new(),
        format!("config     {}", config.config_path.display()),
        format!("audit dir  {}", config.audit_dir_path().display()),
        format!("fallback   {}", config.admission.fallback_policy),
        String::new(),
    ];

    let counts = plane.status();
    let width = counts
        .iter()
        .map(|(log, _)| log.to_string().len())
        .max()
        .unwrap_or(0);
    for (log, count) in counts {
        let kind = if log.is_output() { "out" } else { "in " };
        lines.push(format!("  [{kind}] {:<width$}  {count}", log.to_string()));
    }
    lines.join("\n")
}
