//! 可逆命令与线性撤销/重做历史。
//!
//! 命令在用户手势结束时构造，此时场景已处于 `after` 状态；入栈只是记账。

use sced_core::object::{ObjectKind, SceneObjectRef};
use sced_core::snapshot::{
    GeometrySnapshot, LightSnapshot, ObjectSpec, PropertySnapshot, TransformSnapshot,
};
use tracing::{debug, info};

use crate::backend::SceneBackend;
use crate::registry::SceneRegistry;

/// 几何编辑的来源，只影响菜单文字。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryEditKind {
    Vertices,
    Faces,
    DeleteFace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    pub target: SceneObjectRef,
    pub before: PropertySnapshot,
    pub after: PropertySnapshot,
}

/// 批量删除中的单个对象，保留恢复所需的名称与描述。
#[derive(Debug, Clone, PartialEq)]
pub struct DeletedObject {
    pub target: SceneObjectRef,
    pub name: String,
    pub spec: ObjectSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddObject {
        target: SceneObjectRef,
        name: String,
        spec: ObjectSpec,
    },
    DeleteObject {
        target: SceneObjectRef,
        name: String,
        spec: ObjectSpec,
    },
    DeleteObjects {
        objects: Vec<DeletedObject>,
    },
    Transform {
        target: SceneObjectRef,
        before: TransformSnapshot,
        after: TransformSnapshot,
    },
    PropertyChange {
        target: SceneObjectRef,
        before: PropertySnapshot,
        after: PropertySnapshot,
    },
    BatchPropertyChange {
        entries: Vec<PropertyEntry>,
    },
    GeometryEdit {
        target: SceneObjectRef,
        kind: GeometryEditKind,
        before: GeometrySnapshot,
        after: GeometrySnapshot,
    },
    LightEdit {
        target: SceneObjectRef,
        before: LightSnapshot,
        after: LightSnapshot,
    },
}

impl Command {
    /// 分配唯一名称并创建对象，返回已生效的添加命令。
    pub fn spawn(
        backend: &mut dyn SceneBackend,
        registry: &mut SceneRegistry,
        base_name: &str,
        spec: ObjectSpec,
    ) -> Command {
        let kind = match spec {
            ObjectSpec::Mesh(_) => ObjectKind::Mesh,
            ObjectSpec::Light(_) => ObjectKind::Light,
        };
        let (target, name) = registry.allocate(kind, base_name);
        backend.create_object(target, &spec);
        info!(%target, name = %name, "已添加对象");
        Command::AddObject { target, name, spec }
    }

    /// 变换命令；前后相同时返回 `None`。
    pub fn transform(
        target: SceneObjectRef,
        before: TransformSnapshot,
        after: TransformSnapshot,
    ) -> Option<Command> {
        (before != after).then_some(Command::Transform { target, before, after })
    }

    pub fn property_change(
        target: SceneObjectRef,
        before: PropertySnapshot,
        after: PropertySnapshot,
    ) -> Option<Command> {
        (before != after).then_some(Command::PropertyChange { target, before, after })
    }

    /// 多对象属性修改；过滤掉未变化的条目，只剩一个时退化为单对象命令。
    pub fn property_batch(entries: Vec<PropertyEntry>) -> Option<Command> {
        let mut changed: Vec<PropertyEntry> =
            entries.into_iter().filter(|entry| entry.before != entry.after).collect();
        match changed.len() {
            0 => None,
            1 => changed.pop().map(|entry| Command::PropertyChange {
                target: entry.target,
                before: entry.before,
                after: entry.after,
            }),
            _ => Some(Command::BatchPropertyChange { entries: changed }),
        }
    }

    /// 删除一组对象；只有一个时退化为单对象命令。
    pub fn deletion(mut objects: Vec<DeletedObject>) -> Option<Command> {
        match objects.len() {
            0 => None,
            1 => objects.pop().map(|object| Command::DeleteObject {
                target: object.target,
                name: object.name,
                spec: object.spec,
            }),
            _ => Some(Command::DeleteObjects { objects }),
        }
    }

    pub fn geometry_edit(
        target: SceneObjectRef,
        kind: GeometryEditKind,
        before: GeometrySnapshot,
        after: GeometrySnapshot,
    ) -> Option<Command> {
        (before != after).then_some(Command::GeometryEdit { target, kind, before, after })
    }

    pub fn light_edit(
        target: SceneObjectRef,
        before: LightSnapshot,
        after: LightSnapshot,
    ) -> Option<Command> {
        (before != after).then_some(Command::LightEdit { target, before, after })
    }

    /// 菜单显示文字。
    pub fn label(&self) -> String {
        match self {
            Command::AddObject { name, .. } => format!("Add {name}"),
            Command::DeleteObject { name, .. } => format!("Delete {name}"),
            Command::DeleteObjects { objects } => format!("Delete {} Objects", objects.len()),
            Command::Transform { .. } => "Transform".to_string(),
            Command::PropertyChange { .. } => "Change Appearance".to_string(),
            Command::BatchPropertyChange { entries } => {
                format!("Change {} Object(s)", entries.len())
            }
            Command::GeometryEdit { kind, .. } => match kind {
                GeometryEditKind::Vertices => "Edit Vertices".to_string(),
                GeometryEditKind::Faces => "Edit Faces".to_string(),
                GeometryEditKind::DeleteFace => "Delete Face".to_string(),
            },
            Command::LightEdit { .. } => "Edit Light".to_string(),
        }
    }

    /// 命令涉及的对象。
    pub fn targets(&self) -> Vec<SceneObjectRef> {
        match self {
            Command::BatchPropertyChange { entries } => {
                entries.iter().map(|entry| entry.target).collect()
            }
            Command::DeleteObjects { objects } => {
                objects.iter().map(|object| object.target).collect()
            }
            Command::AddObject { target, .. }
            | Command::DeleteObject { target, .. }
            | Command::Transform { target, .. }
            | Command::PropertyChange { target, .. }
            | Command::GeometryEdit { target, .. }
            | Command::LightEdit { target, .. } => vec![*target],
        }
    }

    pub fn undo(&self, backend: &mut dyn SceneBackend, registry: &mut SceneRegistry) {
        self.apply(backend, registry, Direction::Backward);
    }

    pub fn redo(&self, backend: &mut dyn SceneBackend, registry: &mut SceneRegistry) {
        self.apply(backend, registry, Direction::Forward);
    }

    fn apply(
        &self,
        backend: &mut dyn SceneBackend,
        registry: &mut SceneRegistry,
        direction: Direction,
    ) {
        match self {
            Command::AddObject { target, name, spec } => match direction {
                Direction::Forward => materialize(backend, registry, *target, name, spec),
                Direction::Backward => dematerialize(backend, registry, *target),
            },
            Command::DeleteObject { target, name, spec } => match direction {
                Direction::Forward => dematerialize(backend, registry, *target),
                Direction::Backward => materialize(backend, registry, *target, name, spec),
            },
            Command::DeleteObjects { objects } => {
                for object in objects {
                    match direction {
                        Direction::Forward => dematerialize(backend, registry, object.target),
                        Direction::Backward => materialize(
                            backend,
                            registry,
                            object.target,
                            &object.name,
                            &object.spec,
                        ),
                    }
                }
            }
            Command::Transform { target, before, after } => {
                let snapshot = direction.pick(before, after);
                if live(backend, *target) {
                    backend.set_transform(*target, snapshot);
                }
            }
            Command::PropertyChange { target, before, after } => {
                let snapshot = direction.pick(before, after);
                if live(backend, *target) {
                    backend.set_properties(*target, snapshot);
                }
            }
            Command::BatchPropertyChange { entries } => {
                for entry in entries {
                    let snapshot = direction.pick(&entry.before, &entry.after);
                    if live(backend, entry.target) {
                        backend.set_properties(entry.target, snapshot);
                    }
                }
            }
            Command::GeometryEdit { target, before, after, .. } => {
                let snapshot = direction.pick(before, after);
                if live(backend, *target) {
                    backend.set_geometry(*target, snapshot);
                }
            }
            Command::LightEdit { target, before, after } => {
                let snapshot = direction.pick(before, after);
                if live(backend, *target) {
                    backend.set_light(*target, snapshot);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[inline]
    fn pick<'a, T>(self, before: &'a T, after: &'a T) -> &'a T {
        match self {
            Direction::Forward => after,
            Direction::Backward => before,
        }
    }
}

fn live(backend: &dyn SceneBackend, target: SceneObjectRef) -> bool {
    let resolved = backend.resolve(target);
    if !resolved {
        debug!(%target, "目标已失效，忽略命令");
    }
    resolved
}

/// 已存在时不重复创建，保证新入栈命令的重做没有可见效果。
fn materialize(
    backend: &mut dyn SceneBackend,
    registry: &mut SceneRegistry,
    target: SceneObjectRef,
    name: &str,
    spec: &ObjectSpec,
) {
    if !backend.resolve(target) {
        backend.create_object(target, spec);
    }
    if !registry.contains(target) {
        registry.restore(target, name);
    }
}

fn dematerialize(
    backend: &mut dyn SceneBackend,
    registry: &mut SceneRegistry,
    target: SceneObjectRef,
) {
    if backend.resolve(target) {
        backend.destroy_object(target);
    } else {
        debug!(%target, "目标已失效，忽略删除");
    }
    registry.remove(target);
}

/// 线性历史：`index` 之前为已执行，之后为可重做尾部。
#[derive(Debug)]
pub struct CommandStack {
    commands: Vec<Command>,
    index: usize,
    limit: usize,
}

impl Default for CommandStack {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandStack {
    pub fn new() -> Self {
        Self::with_limit(0)
    }

    /// `limit` 为 0 表示不限深度；超出时淘汰最早的命令。
    pub fn with_limit(limit: usize) -> Self {
        Self {
            commands: Vec::new(),
            index: 0,
            limit,
        }
    }

    /// 丢弃重做尾部并追加命令，不执行命令本身。
    pub fn push(&mut self, command: Command) {
        let discarded = self.commands.len() - self.index;
        self.commands.truncate(self.index);
        info!(label = %command.label(), discarded, "命令入栈");
        self.commands.push(command);
        if self.limit > 0 && self.commands.len() > self.limit {
            let overflow = self.commands.len() - self.limit;
            self.commands.drain(..overflow);
        }
        self.index = self.commands.len();
    }

    /// 有可撤销命令时执行撤销并返回 `true`。
    pub fn undo(&mut self, backend: &mut dyn SceneBackend, registry: &mut SceneRegistry) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        let command = &self.commands[self.index];
        debug!(label = %command.label(), "撤销");
        command.undo(backend, registry);
        backend.render();
        true
    }

    pub fn redo(&mut self, backend: &mut dyn SceneBackend, registry: &mut SceneRegistry) -> bool {
        let Some(command) = self.commands.get(self.index) else {
            return false;
        };
        debug!(label = %command.label(), "重做");
        command.redo(backend, registry);
        self.index += 1;
        backend.render();
        true
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.index < self.commands.len()
    }

    pub fn undo_label(&self) -> Option<String> {
        self.index
            .checked_sub(1)
            .and_then(|i| self.commands.get(i))
            .map(Command::label)
    }

    pub fn redo_label(&self) -> Option<String> {
        self.commands.get(self.index).map(Command::label)
    }

    /// 历史中命令总数（含可重做尾部）。
    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// 已执行部分，最早的在前。
    pub fn done(&self) -> &[Command] {
        &self.commands[..self.index]
    }
}

#[cfg(test)]
mod tests {
    use sced_core::geometry::{Point3, Vector3};
    use sced_core::snapshot::{GeometryDescriptor, MeshSpec};

    use super::*;
    use crate::memory::MemoryBackend;

    fn cube_spec() -> ObjectSpec {
        ObjectSpec::Mesh(MeshSpec {
            geometry: GeometryDescriptor::Cuboid {
                lengths: Vector3::new(1.0, 1.0, 1.0),
                center: Point3::ORIGIN,
            },
            transform: TransformSnapshot::identity(),
            properties: PropertySnapshot::default(),
        })
    }

    fn moved(x: f64) -> TransformSnapshot {
        TransformSnapshot::from_translation(Point3::new(x, 0.0, 0.0))
    }

    #[test]
    fn redo_after_push_is_invisible_and_undo_removes() {
        let mut backend = MemoryBackend::new();
        let mut registry = SceneRegistry::new();
        let mut history = CommandStack::new();

        let add = Command::spawn(&mut backend, &mut registry, "cube", cube_spec());
        let target = add.targets()[0];
        add.redo(&mut backend, &mut registry);
        assert_eq!(backend.object_count(), 1);
        history.push(add);

        assert!(history.undo(&mut backend, &mut registry));
        assert!(!backend.resolve(target));
        assert!(registry.name_of(target).is_none());
        assert!(!history.undo(&mut backend, &mut registry));

        assert!(history.redo(&mut backend, &mut registry));
        assert_eq!(registry.name_of(target), Some("cube"));
        assert!(!history.redo(&mut backend, &mut registry));
    }

    #[test]
    fn stale_targets_degrade_to_noops() {
        let mut backend = MemoryBackend::new();
        let mut registry = SceneRegistry::new();
        let mut history = CommandStack::new();
        let add = Command::spawn(&mut backend, &mut registry, "cube", cube_spec());
        let target = add.targets()[0];
        history.push(add);

        backend.set_transform(target, &moved(3.0));
        history.push(Command::transform(target, moved(0.0), moved(3.0)).expect("changed"));

        backend.destroy_object(target);
        assert!(history.undo(&mut backend, &mut registry));
        assert!(history.redo(&mut backend, &mut registry));
        assert!(!backend.resolve(target));
    }

    #[test]
    fn unchanged_snapshots_produce_no_command() {
        let target = SceneObjectRef::Mesh(sced_core::object::ObjectId::new(1));
        assert!(Command::transform(target, moved(1.0), moved(1.0)).is_none());
        let props = PropertySnapshot::default();
        assert!(Command::property_change(target, props, props).is_none());
        let entry = PropertyEntry { target, before: props, after: props };
        assert!(Command::property_batch(vec![entry]).is_none());
    }

    #[test]
    fn push_truncates_tail_and_limit_evicts_oldest() {
        let mut backend = MemoryBackend::new();
        let mut registry = SceneRegistry::new();
        let mut history = CommandStack::with_limit(3);
        let add = Command::spawn(&mut backend, &mut registry, "cube", cube_spec());
        let target = add.targets()[0];
        history.push(add);
        for step in 1..=3 {
            let x = step as f64;
            backend.set_transform(target, &moved(x));
            history.push(Command::transform(target, moved(x - 1.0), moved(x)).expect("changed"));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.limit(), 3);
        assert_eq!(history.undo_label().as_deref(), Some("Transform"));

        history.undo(&mut backend, &mut registry);
        history.undo(&mut backend, &mut registry);
        assert_eq!(backend.transform(target), Some(moved(1.0)));
        assert!(history.can_redo());

        backend.set_transform(target, &moved(9.0));
        history.push(Command::transform(target, moved(1.0), moved(9.0)).expect("changed"));
        assert!(!history.can_redo());
        assert_eq!(history.len(), 2);
        assert!(history.redo_label().is_none());
    }

    #[test]
    fn labels_follow_command_kind() {
        let mut backend = MemoryBackend::new();
        let mut registry = SceneRegistry::new();
        let first = Command::spawn(&mut backend, &mut registry, "cube", cube_spec());
        let second = Command::spawn(&mut backend, &mut registry, "cube", cube_spec());
        assert_eq!(first.label(), "Add cube");
        assert_eq!(second.label(), "Add cube_2");

        let props = PropertySnapshot::default();
        let entries: Vec<_> = registry
            .iter()
            .map(|(target, _)| PropertyEntry {
                target,
                before: props,
                after: props.with_color([1.0, 0.0, 0.0]),
            })
            .collect();
        let batch = Command::property_batch(entries).expect("changed");
        assert_eq!(batch.label(), "Change 2 Object(s)");

        let deleted: Vec<_> = registry
            .iter()
            .map(|(target, name)| DeletedObject {
                target,
                name: name.to_string(),
                spec: cube_spec(),
            })
            .collect();
        assert!(Command::deletion(Vec::new()).is_none());
        let single = Command::deletion(deleted[..1].to_vec()).expect("one object");
        assert_eq!(single.label(), "Delete cube");
        let both = Command::deletion(deleted).expect("two objects");
        assert_eq!(both.label(), "Delete 2 Objects");
        assert_eq!(both.targets().len(), 2);
    }
}
