//! 视口输入分发：修饰键状态、数值输入缓冲与单一活动工具。

use once_cell::sync::Lazy;
use regex::Regex;
use sced_core::geometry::Point2;
use tracing::{debug, info};

use crate::backend::SceneBackend;
use crate::command::CommandStack;
use crate::editor::EditorSettings;
use crate::errors::ToolError;
use crate::registry::SceneRegistry;
use crate::tools::{Tool, ToolContext, ToolFlow, ToolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Shift,
    Control,
    Alt,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
    Char(char),
}

impl Key {
    /// 解析键名（大小写不敏感），单个字符视为字符键。
    pub fn from_name(name: &str) -> Option<Key> {
        let key = match name.to_ascii_lowercase().as_str() {
            "shift" => Key::Shift,
            "ctrl" | "control" => Key::Control,
            "alt" => Key::Alt,
            "enter" | "return" => Key::Enter,
            "escape" | "esc" => Key::Escape,
            "tab" => Key::Tab,
            "backspace" => Key::Backspace,
            "delete" | "del" => Key::Delete,
            _ => {
                let mut chars = name.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

/// 当前按住的修饰键，工具在每次事件时同步查询。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    fn update(&mut self, key: Key, pressed: bool) -> bool {
        match key {
            Key::Shift => self.shift = pressed,
            Key::Control => self.ctrl = pressed,
            Key::Alt => self.alt = pressed,
            _ => return false,
        }
        true
    }
}

/// 视口原始事件。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { position: Point2, button: PointerButton },
    PointerUp { position: Point2, button: PointerButton },
    PointerMove { position: Point2 },
    KeyDown(Key),
    KeyUp(Key),
    /// 一帧渲染完成（相机可能已变化）。
    Frame,
}

/// 控制器翻译后交给工具的输入。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolInput {
    PointerDown { position: Point2, button: PointerButton },
    PointerUp { position: Point2, button: PointerButton },
    PointerMove { position: Point2 },
    /// Enter：提交当前阶段。
    Confirm,
    /// Escape：退一步或中止，由工具决定。
    Cancel,
    /// Delete / Backspace（数值缓冲为空时）。
    Delete,
    /// 数值缓冲或当前字段发生变化。
    NumericChanged,
    /// 其余未被控制器消费的按键。
    Key(Key),
    Frame,
}

/// 工具关心的事件类别，启动时声明，停止时随工具一起撤销。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventMask(u8);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);
    pub const POINTER_DOWN: EventMask = EventMask(1);
    pub const POINTER_UP: EventMask = EventMask(1 << 1);
    pub const POINTER_MOVE: EventMask = EventMask(1 << 2);
    pub const KEYS: EventMask = EventMask(1 << 3);
    pub const FRAME: EventMask = EventMask(1 << 4);
    pub const POINTER: EventMask =
        EventMask(Self::POINTER_DOWN.0 | Self::POINTER_UP.0 | Self::POINTER_MOVE.0);

    #[inline]
    pub const fn union(self, other: EventMask) -> EventMask {
        EventMask(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }

    fn of(event: &InputEvent) -> EventMask {
        match event {
            InputEvent::PointerDown { .. } => Self::POINTER_DOWN,
            InputEvent::PointerUp { .. } => Self::POINTER_UP,
            InputEvent::PointerMove { .. } => Self::POINTER_MOVE,
            InputEvent::KeyDown(_) | InputEvent::KeyUp(_) => Self::KEYS,
            InputEvent::Frame => Self::FRAME,
        }
    }
}

/// 带维度输入的字段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Width,
    Depth,
    Height,
}

impl NumericField {
    pub fn shortcut(self) -> char {
        match self {
            NumericField::Width => 'w',
            NumericField::Depth => 'd',
            NumericField::Height => 'h',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NumericField::Width => "W",
            NumericField::Depth => "D",
            NumericField::Height => "H",
        }
    }
}

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([+-]?\d*\.?\d+(?:[eE][+-]?\d+)?)").expect("leading number pattern is valid")
});

/// 取文本开头的第一个数值，忽略尾随单位；无法解析时为 0。
pub fn parse_leading_number(text: &str) -> f64 {
    LEADING_NUMBER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}

/// 数值输入状态：当前字段与文本缓冲。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericEntry {
    field: Option<NumericField>,
    buffer: String,
}

impl NumericEntry {
    /// 进入数值模式后，指针移动不再驱动尺寸。
    #[inline]
    pub fn is_active(&self) -> bool {
        self.field.is_some()
    }

    #[inline]
    pub fn field(&self) -> Option<NumericField> {
        self.field
    }

    #[inline]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn value(&self) -> f64 {
        parse_leading_number(&self.buffer)
    }

    /// 选中字段并清空缓冲。
    pub fn select(&mut self, field: NumericField) {
        self.field = Some(field);
        self.buffer.clear();
    }

    /// 切换字段但保留缓冲。
    pub fn focus(&mut self, field: NumericField) {
        self.field = Some(field);
    }

    pub fn push(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn pop(&mut self) -> bool {
        self.buffer.pop().is_some()
    }

    pub fn reset(&mut self) {
        self.field = None;
        self.buffer.clear();
    }
}

/// 分发结果：`Ignored` 的事件留给选择、gizmo 或相机处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Consumed,
    Ignored,
    /// 工具在本次事件中结束。
    ToolFinished { kind: ToolKind, cancelled: bool },
}

/// 工具访问场景所需的借用集合。
pub struct SceneParts<'a> {
    pub backend: &'a mut dyn SceneBackend,
    pub registry: &'a mut SceneRegistry,
    pub history: &'a mut CommandStack,
    pub settings: &'a EditorSettings,
}

struct ActiveTool {
    tool: Box<dyn Tool>,
    subscriptions: EventMask,
}

/// 保证全局至多一个活动工具，并持有修饰键与数值输入状态。
#[derive(Default)]
pub struct InteractionController {
    modifiers: Modifiers,
    numeric: NumericEntry,
    active: Option<ActiveTool>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    #[inline]
    pub fn numeric(&self) -> &NumericEntry {
        &self.numeric
    }

    pub fn active_kind(&self) -> Option<ToolKind> {
        self.active.as_ref().map(|active| active.tool.kind())
    }

    #[inline]
    pub fn has_active_tool(&self) -> bool {
        self.active.is_some()
    }

    /// 先以取消方式停止当前工具，再启动新工具。
    pub fn start_tool(
        &mut self,
        mut tool: Box<dyn Tool>,
        parts: SceneParts<'_>,
    ) -> Result<(), ToolError> {
        let SceneParts { backend, registry, history, settings } = parts;
        if let Some(previous) = self.active.take() {
            let parts = SceneParts {
                backend: &mut *backend,
                registry: &mut *registry,
                history: &mut *history,
                settings,
            };
            self.finish(previous, true, parts);
        }
        self.numeric.reset();
        let mut ctx = ToolContext {
            backend,
            registry,
            history,
            settings,
            modifiers: self.modifiers,
            numeric: &mut self.numeric,
        };
        tool.start(&mut ctx)?;
        let subscriptions = tool.subscriptions();
        info!(tool = ?tool.kind(), "工具已启动");
        self.active = Some(ActiveTool { tool, subscriptions });
        Ok(())
    }

    /// 停止当前工具；返回被停止的工具类型。
    pub fn stop_tool(&mut self, cancel: bool, parts: SceneParts<'_>) -> Option<ToolKind> {
        let active = self.active.take()?;
        let kind = active.tool.kind();
        self.finish(active, cancel, parts);
        Some(kind)
    }

    fn finish(&mut self, mut active: ActiveTool, cancel: bool, parts: SceneParts<'_>) {
        let mut ctx = ToolContext {
            backend: parts.backend,
            registry: parts.registry,
            history: parts.history,
            settings: parts.settings,
            modifiers: self.modifiers,
            numeric: &mut self.numeric,
        };
        active.tool.stop(cancel, &mut ctx);
        ctx.backend.render();
        info!(tool = ?active.tool.kind(), cancel, "工具已停止");
        self.numeric.reset();
    }

    /// 更新修饰键并把事件交给活动工具。
    pub fn dispatch(&mut self, event: InputEvent, parts: SceneParts<'_>) -> EventOutcome {
        match event {
            InputEvent::KeyDown(key) if self.modifiers.update(key, true) => {}
            InputEvent::KeyUp(key) if self.modifiers.update(key, false) => {}
            _ => {}
        }

        let Some(active) = self.active.as_mut() else {
            return EventOutcome::Ignored;
        };
        if !active.subscriptions.contains(EventMask::of(&event)) {
            return EventOutcome::Ignored;
        }

        let fields = active.tool.numeric_fields();
        let input = match event {
            InputEvent::PointerDown { position, button } => {
                ToolInput::PointerDown { position, button }
            }
            InputEvent::PointerUp { position, button } => ToolInput::PointerUp { position, button },
            InputEvent::PointerMove { position } => ToolInput::PointerMove { position },
            InputEvent::Frame => ToolInput::Frame,
            InputEvent::KeyUp(_) => return EventOutcome::Consumed,
            InputEvent::KeyDown(Key::Shift | Key::Control | Key::Alt) => {
                return EventOutcome::Consumed;
            }
            InputEvent::KeyDown(Key::Enter) => ToolInput::Confirm,
            InputEvent::KeyDown(Key::Escape) => ToolInput::Cancel,
            InputEvent::KeyDown(Key::Delete) => ToolInput::Delete,
            InputEvent::KeyDown(Key::Backspace) => {
                if fields.is_empty() {
                    ToolInput::Delete
                } else if self.numeric.pop() {
                    ToolInput::NumericChanged
                } else {
                    return EventOutcome::Consumed;
                }
            }
            InputEvent::KeyDown(Key::Tab) => {
                if fields.is_empty() {
                    ToolInput::Key(Key::Tab)
                } else {
                    let next = next_field(fields, self.numeric.field());
                    self.numeric.focus(next);
                    debug!(field = next.label(), "切换数值字段");
                    return EventOutcome::Consumed;
                }
            }
            InputEvent::KeyDown(Key::Char(c)) => match numeric_char(fields, c) {
                NumericChar::Select(field) => {
                    self.numeric.select(field);
                    return EventOutcome::Consumed;
                }
                NumericChar::Append => {
                    if !self.numeric.is_active() {
                        self.numeric.select(fields[0]);
                    }
                    self.numeric.push(c);
                    ToolInput::NumericChanged
                }
                NumericChar::Ignore => return EventOutcome::Consumed,
                NumericChar::PassThrough => ToolInput::Key(Key::Char(c)),
            },
        };

        let mut ctx = ToolContext {
            backend: &mut *parts.backend,
            registry: &mut *parts.registry,
            history: &mut *parts.history,
            settings: parts.settings,
            modifiers: self.modifiers,
            numeric: &mut self.numeric,
        };
        let flow = active.tool.handle(&input, &mut ctx);
        match flow {
            ToolFlow::Continue => EventOutcome::Consumed,
            ToolFlow::Finished { cancelled } => {
                let kind = active.tool.kind();
                if let Some(finished) = self.active.take() {
                    self.finish(finished, cancelled, parts);
                }
                EventOutcome::ToolFinished { kind, cancelled }
            }
        }
    }
}

enum NumericChar {
    Select(NumericField),
    Append,
    Ignore,
    PassThrough,
}

fn numeric_char(fields: &[NumericField], c: char) -> NumericChar {
    if fields.is_empty() {
        return NumericChar::PassThrough;
    }
    if c.is_ascii_digit() || c == '.' || c == '-' {
        return NumericChar::Append;
    }
    let lower = c.to_ascii_lowercase();
    match fields.iter().find(|field| field.shortcut() == lower) {
        Some(field) => NumericChar::Select(*field),
        // 其余字母（如单位后缀）忽略
        None if c.is_alphabetic() => NumericChar::Ignore,
        None => NumericChar::PassThrough,
    }
}

/// 未激活任何字段时第一个字段是隐式焦点，Tab 从它之后开始。
fn next_field(fields: &[NumericField], current: Option<NumericField>) -> NumericField {
    let position = match current {
        None => Some(0),
        Some(field) => fields.iter().position(|f| *f == field),
    };
    match position {
        Some(i) => fields[(i + 1) % fields.len()],
        None => fields[0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_number_ignores_units_and_garbage() {
        assert_eq!(parse_leading_number("2.5m"), 2.5);
        assert_eq!(parse_leading_number("  -3"), -3.0);
        assert_eq!(parse_leading_number(".5"), 0.5);
        assert_eq!(parse_leading_number("1e2cm"), 100.0);
        assert_eq!(parse_leading_number("-"), 0.0);
        assert_eq!(parse_leading_number(""), 0.0);
        assert_eq!(parse_leading_number("abc"), 0.0);
    }

    #[test]
    fn numeric_chars_route_by_field_set() {
        let base = [NumericField::Width, NumericField::Depth];
        assert!(matches!(numeric_char(&base, 'D'), NumericChar::Select(NumericField::Depth)));
        assert!(matches!(numeric_char(&base, '7'), NumericChar::Append));
        assert!(matches!(numeric_char(&base, 'h'), NumericChar::Ignore));
        assert!(matches!(numeric_char(&[], 'x'), NumericChar::PassThrough));
    }

    #[test]
    fn tab_cycles_fields() {
        let base = [NumericField::Width, NumericField::Depth];
        assert_eq!(next_field(&base, None), NumericField::Depth);
        assert_eq!(next_field(&[NumericField::Height], None), NumericField::Height);
        assert_eq!(next_field(&base, Some(NumericField::Width)), NumericField::Depth);
        assert_eq!(next_field(&base, Some(NumericField::Depth)), NumericField::Width);
        assert_eq!(
            next_field(&[NumericField::Height], Some(NumericField::Width)),
            NumericField::Height
        );
    }

    #[test]
    fn event_mask_filters_by_kind() {
        let mask = EventMask::POINTER.union(EventMask::KEYS);
        assert!(mask.contains(EventMask::POINTER_MOVE));
        assert!(mask.contains(EventMask::KEYS));
        assert!(!mask.contains(EventMask::FRAME));
        assert_eq!(Key::from_name("ESC"), Some(Key::Escape));
        assert_eq!(Key::from_name("x"), Some(Key::Char('x')));
        assert_eq!(Key::from_name("nope"), None);
    }
}
