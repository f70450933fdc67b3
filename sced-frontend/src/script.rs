//! 行式输入脚本：每行一个视口事件或编辑动作，`#` 开头为注释。
//!
//! ```text
//! action tool.add_cube
//! down 50 50
//! move 90 10
//! key enter
//! type 3
//! ```

use sced_core::geometry::Point2;
use sced_core::snapshot::TransformSnapshot;
use sced_engine::interaction::{Key, PointerButton};

use crate::errors::FrontendError;

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Down { position: Point2, button: PointerButton },
    Up { position: Point2, button: PointerButton },
    Move { position: Point2 },
    KeyDown(Key),
    KeyUp(Key),
    /// 逐字符按下，用于数值输入。
    Type(String),
    /// 一帧渲染。
    Frame,
    Action { name: String, args: Vec<String> },
    /// `None` 表示清空选择。
    Select(Option<String>),
    /// 只改变主键的真实状态，不产生事件（模拟丢失的释放事件）。
    PrimaryButton(bool),
    Color([f64; 3]),
    GizmoBegin,
    GizmoPropose(TransformSnapshot),
    /// 绕 Z 轴旋转主选中对象若干度，作为 gizmo 提案。
    GizmoTurn(f64),
    GizmoEnd,
}

/// 解析整份脚本；空行与注释跳过，行号从 1 开始。
pub fn parse_script(text: &str) -> Result<Vec<ScriptStep>, FrontendError> {
    let mut steps = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = parse_line(line).map_err(|message| FrontendError::ScriptParse {
            line: index + 1,
            message,
        })?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_line(line: &str) -> Result<ScriptStep, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err("空行".to_string());
    };
    let rest: Vec<&str> = words.collect();
    let step = match verb.to_ascii_lowercase().as_str() {
        "down" => {
            let (position, button) = pointer_args(&rest)?;
            ScriptStep::Down { position, button }
        }
        "up" => {
            let (position, button) = pointer_args(&rest)?;
            ScriptStep::Up { position, button }
        }
        "move" => {
            expect_count(&rest, 2)?;
            ScriptStep::Move {
                position: point_arg(&rest)?,
            }
        }
        "key" => ScriptStep::KeyDown(key_arg(&rest)?),
        "release" => ScriptStep::KeyUp(key_arg(&rest)?),
        "type" => {
            if rest.is_empty() {
                return Err("`type` 需要文本".to_string());
            }
            ScriptStep::Type(rest.concat())
        }
        "render" | "frame" => {
            expect_count(&rest, 0)?;
            ScriptStep::Frame
        }
        "action" => {
            let Some((name, args)) = rest.split_first() else {
                return Err("`action` 需要动作名".to_string());
            };
            ScriptStep::Action {
                name: (*name).to_string(),
                args: args.iter().map(|arg| (*arg).to_string()).collect(),
            }
        }
        "select" => {
            expect_count(&rest, 1)?;
            match rest[0] {
                "none" => ScriptStep::Select(None),
                name => ScriptStep::Select(Some(name.to_string())),
            }
        }
        "button" => {
            expect_count(&rest, 1)?;
            match rest[0] {
                "down" => ScriptStep::PrimaryButton(true),
                "up" => ScriptStep::PrimaryButton(false),
                other => return Err(format!("未知按键状态: {other}")),
            }
        }
        "color" => {
            expect_count(&rest, 3)?;
            let values = numbers(&rest)?;
            ScriptStep::Color([values[0], values[1], values[2]])
        }
        "gizmo" => parse_gizmo(&rest)?,
        "propose" => ScriptStep::GizmoPropose(matrix_arg(&rest)?),
        other => return Err(format!("未知指令: {other}")),
    };
    Ok(step)
}

fn parse_gizmo(rest: &[&str]) -> Result<ScriptStep, String> {
    let Some((sub, args)) = rest.split_first() else {
        return Err("`gizmo` 需要子命令".to_string());
    };
    match *sub {
        "begin" => Ok(ScriptStep::GizmoBegin),
        "end" => Ok(ScriptStep::GizmoEnd),
        "propose" => Ok(ScriptStep::GizmoPropose(matrix_arg(args)?)),
        "turn" => {
            expect_count(args, 1)?;
            Ok(ScriptStep::GizmoTurn(numbers(args)?[0]))
        }
        other => Err(format!("未知 gizmo 子命令: {other}")),
    }
}

fn expect_count(args: &[&str], count: usize) -> Result<(), String> {
    if args.len() == count {
        Ok(())
    } else {
        Err(format!("需要 {count} 个参数，实际 {} 个", args.len()))
    }
}

fn numbers(args: &[&str]) -> Result<Vec<f64>, String> {
    args.iter()
        .map(|arg| {
            arg.parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| format!("无效数值: {arg}"))
        })
        .collect()
}

fn point_arg(args: &[&str]) -> Result<Point2, String> {
    let values = numbers(&args[..2])?;
    Ok(Point2::new(values[0], values[1]))
}

fn pointer_args(args: &[&str]) -> Result<(Point2, PointerButton), String> {
    let button = match args {
        [_, _] => PointerButton::Left,
        [_, _, name] => match name.to_ascii_lowercase().as_str() {
            "left" => PointerButton::Left,
            "right" => PointerButton::Right,
            "middle" => PointerButton::Middle,
            other => return Err(format!("未知指针按键: {other}")),
        },
        _ => return Err(format!("需要 2 或 3 个参数，实际 {} 个", args.len())),
    };
    Ok((point_arg(args)?, button))
}

fn key_arg(args: &[&str]) -> Result<Key, String> {
    expect_count(args, 1)?;
    Key::from_name(args[0]).ok_or_else(|| format!("未知按键: {}", args[0]))
}

fn matrix_arg(args: &[&str]) -> Result<TransformSnapshot, String> {
    expect_count(args, 16)?;
    let values = numbers(args)?;
    let mut matrix = [0.0; 16];
    matrix.copy_from_slice(&values);
    Ok(TransformSnapshot::from_row_major(matrix))
}
