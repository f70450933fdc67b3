use std::io::Write;
use std::path::Path;

use sced_config::{AppConfig, OutputFormat};
use sced_frontend::cli::{DEMO_SCRIPT, render_summary, replay, run_script_file};
use sced_frontend::errors::FrontendError;
use sced_frontend::script::parse_script;

fn replay_text(script: &str) -> sced_frontend::session::Session {
    let steps = parse_script(script).expect("script parses");
    replay(&steps, &AppConfig::default())
}

#[test]
fn demo_script_builds_expected_scene() {
    let session = replay_text(DEMO_SCRIPT);
    let summary = session.summary();

    let names: Vec<_> = summary.objects.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["cube", "cube_copy"]);
    let cube = &summary.objects[0];
    assert_eq!(cube.vertices, Some(8));
    assert_eq!(cube.faces, Some(6));
    for (actual, expected) in cube.center.iter().zip([2.0, 2.0, 1.5]) {
        assert!((actual - expected).abs() < 1e-6, "{:?}", cube.center);
    }

    assert_eq!(summary.selection, vec!["cube".to_string()]);
    assert_eq!(summary.transform_mode, "rotate");
    // 撤销掉的聚光灯被随后的外观修改截断
    assert_eq!(summary.history.index, 4);
    assert_eq!(summary.history.len, 4);
    assert_eq!(summary.history.undo.as_deref(), Some("Change Appearance"));
    assert_eq!(summary.history.redo, None);
    assert!(summary.messages.iter().all(|m| m.starts_with("[动作]")));
}

#[test]
fn json_summary_is_machine_readable() {
    let session = replay_text("action light.add directional\naction gizmo.toggle\n");
    let json = render_summary(&session.summary(), OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["objects"][0]["name"], "directional_light");
    assert_eq!(value["objects"][0]["kind"], "light");
    assert!(value["objects"][0].get("vertices").is_none());
    assert_eq!(value["gizmo_enabled"], false);
    assert_eq!(value["history"]["len"], 1);
}

#[test]
fn text_summary_lists_objects_and_history() {
    let session = replay_text("action light.add\naction undo\n");
    let text = render_summary(&session.summary(), OutputFormat::Text).unwrap();
    assert!(text.contains("场景对象 (0):"));
    assert!(text.contains("当前未选中任何对象。"));
    assert!(text.contains("重做=Add point_light"));
}

#[test]
fn right_click_cancels_interactive_add() {
    let session = replay_text(
        "action tool.add_cube\n\
         down 50 50\n\
         move 90 10\n\
         down 90 10 right\n",
    );
    let summary = session.summary();
    assert!(summary.objects.is_empty());
    assert_eq!(summary.active_tool, None);
    assert_eq!(summary.history.len, 0);
}

#[test]
fn unknown_action_is_reported_but_replay_continues() {
    let session = replay_text("action file.open\naction light.add spot\n");
    let summary = session.summary();
    assert_eq!(summary.objects.len(), 1);
    assert_eq!(summary.messages[0], "[失败] 动作 file.open 失败: 未知动作: file.open");
}

#[test]
fn script_file_errors_carry_context() {
    let missing = run_script_file(Path::new("/nonexistent/demo.sced"), &AppConfig::default());
    assert!(matches!(missing, Err(FrontendError::ScriptIo { .. })));

    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    writeln!(file, "action undo\nwiggle 1 2").unwrap();
    let err = run_script_file(file.path(), &AppConfig::default()).unwrap_err();
    assert_eq!(err.to_string(), "脚本第 2 行无法解析: 未知指令: wiggle");
}
