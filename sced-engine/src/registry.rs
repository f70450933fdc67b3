use std::collections::{BTreeMap, HashMap};

use sced_core::object::{ObjectId, ObjectKind, SceneObjectRef};
use tracing::warn;

/// 场景注册表：为对象分配永不复用的编号与唯一显示名，维护双向映射。
///
/// 名称在分配时一次性确定，之后随引用冻结；撤销/重做只会原样恢复。
#[derive(Debug, Default)]
pub struct SceneRegistry {
    next_id: u64,
    names: BTreeMap<SceneObjectRef, String>,
    by_name: HashMap<String, SceneObjectRef>,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配新引用与唯一名称并立即登记。
    pub fn allocate(&mut self, kind: ObjectKind, base_name: &str) -> (SceneObjectRef, String) {
        self.next_id += 1;
        let target = SceneObjectRef::new(kind, ObjectId::new(self.next_id));
        let name = self.unique_name(base_name);
        self.names.insert(target, name.clone());
        self.by_name.insert(name.clone(), target);
        (target, name)
    }

    /// `base`、`base_2`、`base_3` … 中第一个未被占用的名称。
    pub fn unique_name(&self, base_name: &str) -> String {
        if !self.by_name.contains_key(base_name) {
            return base_name.to_string();
        }
        (2..)
            .map(|n| format!("{base_name}_{n}"))
            .find(|candidate| !self.by_name.contains_key(candidate))
            .unwrap_or_else(|| base_name.to_string())
    }

    /// 以冻结的名称重新登记引用（撤销删除、重做添加时使用）。
    ///
    /// 历史严格线性时名称不会冲突；若仍被占用则保留原持有者并返回 `false`。
    pub fn restore(&mut self, target: SceneObjectRef, name: &str) -> bool {
        match self.by_name.get(name) {
            Some(existing) if *existing != target => {
                warn!(%target, name, holder = %existing, "名称已被占用，跳过登记");
                false
            }
            _ => {
                self.names.insert(target, name.to_string());
                self.by_name.insert(name.to_string(), target);
                self.next_id = self.next_id.max(target.id().get());
                true
            }
        }
    }

    pub fn remove(&mut self, target: SceneObjectRef) -> Option<String> {
        let name = self.names.remove(&target)?;
        if self.by_name.get(&name) == Some(&target) {
            self.by_name.remove(&name);
        }
        Some(name)
    }

    #[inline]
    pub fn name_of(&self, target: SceneObjectRef) -> Option<&str> {
        self.names.get(&target).map(String::as_str)
    }

    #[inline]
    pub fn lookup(&self, name: &str) -> Option<SceneObjectRef> {
        self.by_name.get(name).copied()
    }

    #[inline]
    pub fn contains(&self, target: SceneObjectRef) -> bool {
        self.names.contains_key(&target)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 按分配顺序遍历。
    pub fn iter(&self) -> impl Iterator<Item = (SceneObjectRef, &str)> + '_ {
        let mut entries: Vec<_> = self
            .names
            .iter()
            .map(|(target, name)| (*target, name.as_str()))
            .collect();
        entries.sort_by_key(|(target, _)| target.id());
        entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_fill_gaps() {
        let mut registry = SceneRegistry::new();
        let (a, a_name) = registry.allocate(ObjectKind::Mesh, "cube");
        let (_, b_name) = registry.allocate(ObjectKind::Mesh, "cube");
        let (_, c_name) = registry.allocate(ObjectKind::Mesh, "cube");
        assert_eq!(
            (a_name.as_str(), b_name.as_str(), c_name.as_str()),
            ("cube", "cube_2", "cube_3")
        );

        registry.remove(a);
        let (d, d_name) = registry.allocate(ObjectKind::Mesh, "cube");
        assert_eq!(d_name, "cube");
        assert_ne!(d, a, "ids are never reused");
    }

    #[test]
    fn restore_keeps_frozen_name_and_reports_collisions() {
        let mut registry = SceneRegistry::new();
        let (light, name) = registry.allocate(ObjectKind::Light, "point_light");
        assert!(light.is_light());
        assert_eq!(registry.remove(light).as_deref(), Some("point_light"));
        assert!(registry.lookup("point_light").is_none());

        assert!(registry.restore(light, &name));
        assert_eq!(registry.name_of(light), Some("point_light"));

        let (other, _) = registry.allocate(ObjectKind::Light, "spot_light");
        assert!(!registry.restore(other, "point_light"));
        assert_eq!(registry.lookup("point_light"), Some(light));
    }

    #[test]
    fn iteration_follows_allocation_order() {
        let mut registry = SceneRegistry::new();
        let (first, _) = registry.allocate(ObjectKind::Mesh, "b");
        let (second, _) = registry.allocate(ObjectKind::Light, "a");
        let order: Vec<_> = registry.iter().map(|(target, _)| target).collect();
        assert_eq!(order, vec![first, second]);
        assert_eq!(registry.len(), 2);
    }
}
