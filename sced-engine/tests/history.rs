use sced_core::geometry::{Point3, Vector3};
use sced_core::object::SceneObjectRef;
use sced_core::snapshot::{
    GeometryDescriptor, LightKind, MeshSpec, ObjectSpec, PropertySnapshot, Representation,
    TransformSnapshot,
};
use sced_engine::backend::SceneBackend;
use sced_engine::command::Command;
use sced_engine::editor::{Editor, EditorSettings, LightPanel, ResetPart};
use sced_engine::errors::EngineError;
use sced_engine::memory::MemoryBackend;
use sced_engine::registry::SceneRegistry;
use sced_engine::tools::gizmo::TransformMode;

fn editor() -> Editor<MemoryBackend> {
    Editor::new(MemoryBackend::new(), EditorSettings::default())
}

fn cube_spec(x: f64) -> ObjectSpec {
    ObjectSpec::Mesh(MeshSpec {
        geometry: GeometryDescriptor::Cuboid {
            lengths: Vector3::new(1.0, 1.0, 1.0),
            center: Point3::new(0.0, 0.0, 0.5),
        },
        transform: TransformSnapshot::from_translation(Point3::new(x, 0.0, 0.0)),
        properties: PropertySnapshot::default(),
    })
}

fn scene_state(backend: &MemoryBackend) -> Vec<(SceneObjectRef, Option<ObjectSpec>)> {
    backend.objects().map(|target| (target, backend.object_spec(target))).collect()
}

#[test]
fn undo_all_then_redo_all_restores_identical_state() {
    let mut editor = editor();
    let cube = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    let other = editor.add_mesh("cube", cube_spec(3.0)).unwrap();
    assert_eq!(editor.registry().name_of(other), Some("cube_2"));

    editor
        .set_transform(cube, TransformSnapshot::from_translation(Point3::new(0.0, 5.0, 0.0)))
        .unwrap();
    editor.select(Some(other));
    editor.edit_properties(|props| props.color = [1.0, 0.0, 0.0]).unwrap();
    let lamp = editor.add_light(LightKind::Spot).unwrap();
    let mut panel = LightPanel::from_light(&editor.backend().light(lamp).unwrap());
    panel.intensity = 0.4;
    editor.apply_light_settings(lamp, panel).unwrap();
    editor.select(Some(cube));
    editor.delete_selected().unwrap();

    let final_state = scene_state(editor.backend());
    let steps = editor.history().len();
    assert_eq!(steps, 7);

    for _ in 0..steps {
        assert!(editor.undo());
    }
    assert!(!editor.undo());
    assert_eq!(editor.backend().object_count(), 0);
    assert!(editor.registry().is_empty());

    for _ in 0..steps {
        assert!(editor.redo());
    }
    assert!(!editor.redo());
    assert_eq!(scene_state(editor.backend()), final_state);
    assert_eq!(editor.registry().name_of(other), Some("cube_2"));
    assert!(editor.registry().lookup("cube").is_none());
}

#[test]
fn unchanged_edits_do_not_reach_history() {
    let mut editor = editor();
    let cube = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    let current = editor.backend().transform(cube).unwrap();

    assert!(!editor.set_transform(cube, current).unwrap());
    assert!(!editor.edit_properties(|_| {}).unwrap());
    assert!(!editor.reset_transform(cube, ResetPart::Rotation).unwrap());
    assert!(editor.begin_property_edit());
    assert!(!editor.end_property_edit());
    assert_eq!(editor.history().len(), 1);
}

#[test]
fn pushing_after_undo_discards_redo_tail() {
    let mut editor = editor();
    let cube = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    for x in 1..=3 {
        editor
            .set_transform(
                cube,
                TransformSnapshot::from_translation(Point3::new(f64::from(x), 0.0, 0.0)),
            )
            .unwrap();
    }
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(editor.can_redo());

    editor
        .set_transform(cube, TransformSnapshot::from_translation(Point3::new(9.0, 0.0, 0.0)))
        .unwrap();
    assert!(!editor.can_redo());
    assert!(!editor.redo());
    assert_eq!(editor.history().len(), 3);
    assert_eq!(editor.backend().transform(cube).unwrap().translation(), Point3::new(9.0, 0.0, 0.0));
}

#[test]
fn stale_targets_degrade_to_no_ops() {
    let mut backend = MemoryBackend::new();
    let mut registry = SceneRegistry::new();
    let add = Command::spawn(&mut backend, &mut registry, "cube", cube_spec(0.0));
    let target = add.targets()[0];
    let before = backend.transform(target).unwrap();
    let after = TransformSnapshot::from_translation(Point3::new(2.0, 0.0, 0.0));
    let transform = Command::transform(target, before, after).unwrap();

    // 绕过历史直接销毁
    backend.destroy_object(target);
    transform.undo(&mut backend, &mut registry);
    transform.redo(&mut backend, &mut registry);
    assert!(!backend.resolve(target));
}

#[test]
fn history_limit_evicts_oldest() {
    let settings = EditorSettings {
        history_limit: 2,
        ..EditorSettings::default()
    };
    let mut editor = Editor::new(MemoryBackend::new(), settings);
    let cube = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    editor
        .set_transform(cube, TransformSnapshot::from_translation(Point3::new(1.0, 0.0, 0.0)))
        .unwrap();
    editor
        .set_transform(cube, TransformSnapshot::from_translation(Point3::new(2.0, 0.0, 0.0)))
        .unwrap();
    assert_eq!(editor.history().len(), 2);
    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    // 添加命令已被淘汰，对象仍在
    assert!(editor.backend().resolve(cube));
}

#[test]
fn batch_property_change_is_one_step() {
    let mut editor = editor();
    let a = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    let b = editor.add_mesh("cube", cube_spec(2.0)).unwrap();
    let c = editor.add_mesh("cube", cube_spec(4.0)).unwrap();
    editor.select(Some(a));
    editor.add_to_selection(b);
    editor.add_to_selection(c);

    assert!(editor
        .edit_properties(|props| props.representation = Representation::Wireframe)
        .unwrap());
    assert_eq!(editor.undo_label().as_deref(), Some("Change 3 Object(s)"));
    assert!(editor.undo());
    for target in [a, b, c] {
        assert_eq!(
            editor.backend().properties(target).unwrap().representation,
            Representation::Surface
        );
    }
}

#[test]
fn grouped_slider_drag_records_net_change() {
    let mut editor = editor();
    let cube = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    assert!(editor.begin_property_edit());
    for step in 1..=10 {
        editor
            .edit_properties(|props| props.opacity = 1.0 - f64::from(step) * 0.05)
            .unwrap();
    }
    assert!(editor.end_property_edit());
    assert_eq!(editor.history().len(), 2);
    assert_eq!(editor.undo_label().as_deref(), Some("Change Appearance"));
    assert!(editor.undo());
    assert_eq!(editor.backend().properties(cube).unwrap().opacity, 1.0);
}

#[test]
fn duplicate_copies_under_fresh_name_with_offset() {
    let mut editor = editor();
    let cube = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    let copy = editor.duplicate(cube).unwrap();
    assert_eq!(editor.registry().name_of(copy), Some("cube_copy"));
    assert_eq!(
        editor.backend().transform(copy).unwrap().translation(),
        Point3::new(1.0, 1.0, 0.0)
    );
    assert_eq!(editor.backend().geometry(copy), editor.backend().geometry(cube));
    assert_eq!(editor.selection(), &[copy]);

    let again = editor.duplicate(cube).unwrap();
    assert_eq!(editor.registry().name_of(again), Some("cube_copy_2"));
}

#[test]
fn deleted_object_returns_under_its_frozen_name() {
    let mut editor = editor();
    let cube = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    editor.select(Some(cube));
    editor.delete_selected().unwrap();
    assert_eq!(editor.undo_label().as_deref(), Some("Delete cube"));
    assert!(editor.selection().is_empty());
    assert!(matches!(editor.delete_selected(), Err(EngineError::NothingSelected)));

    assert!(editor.undo());
    assert_eq!(editor.registry().lookup("cube"), Some(cube));
    assert!(editor.backend().resolve(cube));
}

#[test]
fn deleting_a_selection_is_one_step() {
    let mut editor = editor();
    let a = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    let b = editor.add_mesh("cube", cube_spec(2.0)).unwrap();
    editor.select(Some(a));
    editor.add_to_selection(b);
    let steps = editor.history().len();

    assert_eq!(editor.delete_selected().unwrap(), 2);
    assert_eq!(editor.history().len(), steps + 1);
    assert_eq!(editor.undo_label().as_deref(), Some("Delete 2 Objects"));
    assert_eq!(editor.backend().object_count(), 0);
    assert!(editor.registry().is_empty());

    assert!(editor.undo());
    assert_eq!(editor.registry().lookup("cube"), Some(a));
    assert_eq!(editor.registry().lookup("cube_2"), Some(b));
    assert_eq!(editor.backend().object_count(), 2);
    assert_eq!(editor.undo_label().as_deref(), Some("Add cube_2"));

    assert!(editor.redo());
    assert!(!editor.backend().resolve(a));
    assert!(!editor.backend().resolve(b));
}

#[test]
fn stale_selection_leaves_scene_untouched() {
    let mut editor = editor();
    let a = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    let b = editor.add_mesh("cube", cube_spec(2.0)).unwrap();
    editor.select(Some(a));
    editor.add_to_selection(b);
    editor.backend_mut().destroy_object(b);
    let steps = editor.history().len();

    assert!(matches!(
        editor.delete_selected(),
        Err(EngineError::ObjectNotFound(target)) if target == b
    ));
    assert!(editor.backend().resolve(a));
    assert_eq!(editor.registry().lookup("cube"), Some(a));
    assert_eq!(editor.history().len(), steps);
}

#[test]
fn reset_transform_parts() {
    let mut editor = editor();
    let cube = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    let scaled = TransformSnapshot::from_row_major([
        2.0, 0.0, 0.0, 5.0, //
        0.0, 3.0, 0.0, 6.0, //
        0.0, 0.0, 4.0, 7.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);
    editor.set_transform(cube, scaled).unwrap();

    assert!(editor.reset_transform(cube, ResetPart::Position).unwrap());
    let current = editor.backend().transform(cube).unwrap();
    assert_eq!(current.translation(), Point3::ORIGIN);
    assert_eq!(current.element(1, 1), 3.0);

    assert!(editor.reset_transform(cube, ResetPart::Scale).unwrap());
    let current = editor.backend().transform(cube).unwrap();
    assert!((current.element(1, 1) - 1.0).abs() < 1e-12);

    editor.set_transform(cube, scaled).unwrap();
    assert!(editor.reset_transform(cube, ResetPart::All).unwrap());
    assert_eq!(editor.backend().transform(cube).unwrap(), TransformSnapshot::identity());
}

#[test]
fn light_panel_and_reset_keep_direction_rules() {
    let mut editor = editor();
    let lamp = editor.add_light(LightKind::Spot).unwrap();
    assert_eq!(editor.registry().name_of(lamp), Some("spot_light"));
    let original = editor.backend().light(lamp).unwrap();

    let mut panel = LightPanel::from_light(&original);
    panel.position = Point3::new(0.0, 0.0, 5.0);
    panel.direction = Vector3::new(0.0, 0.0, -3.0);
    assert!(editor.apply_light_settings(lamp, panel).unwrap());
    let aimed = editor.backend().light(lamp).unwrap();
    assert_eq!(aimed.focal_point, Point3::new(0.0, 0.0, 4.0));
    assert_eq!(editor.undo_label().as_deref(), Some("Edit Light"));

    panel.kind = LightKind::Point;
    editor.apply_light_settings(lamp, panel).unwrap();
    let point = editor.backend().light(lamp).unwrap();
    assert_eq!((point.cone_angle, point.exponent), (180.0, 1.0));

    assert!(editor.reset_transform(lamp, ResetPart::Position).unwrap());
    let reset = editor.backend().light(lamp).unwrap();
    assert_eq!(reset.position, Point3::ORIGIN);
    assert_eq!(reset.focal_point, Point3::new(0.0, 0.0, -1.0));
    assert!(!editor.reset_transform(lamp, ResetPart::Rotation).unwrap());

    assert!(editor.undo());
    assert!(editor.undo());
    assert!(editor.undo());
    assert_eq!(editor.backend().light(lamp).unwrap(), original);
    assert!(matches!(
        editor.set_transform(lamp, TransformSnapshot::identity()),
        Err(EngineError::NotAMesh(_))
    ));
}

#[test]
fn directional_light_gizmo_translate_keeps_focal_point() {
    let mut editor = editor();
    let sun = editor.add_light(LightKind::Directional).unwrap();
    let before = editor.backend().light(sun).unwrap();

    let proposed = TransformSnapshot::from_translation(Point3::new(0.0, 0.0, 20.0));
    assert!(editor.begin_gizmo_drag());
    assert!(editor.gizmo_interact(&proposed));
    assert!(editor.end_gizmo_drag());

    let after = editor.backend().light(sun).unwrap();
    assert_eq!(after.position, Point3::new(0.0, 0.0, 20.0));
    assert_eq!(after.focal_point, before.focal_point);

    editor.set_transform_mode(TransformMode::Rotate);
    assert!(editor.gizmo_interact(&TransformSnapshot::identity()));
    editor.end_gizmo_drag();
    let rotated = editor.backend().light(sun).unwrap();
    assert_eq!(rotated.position, after.position);
    assert_eq!(rotated.focal_point, Point3::new(0.0, 0.0, 19.0));
    assert_eq!(editor.history().len(), 3);
}

#[test]
fn modal_suspension_commits_edit_sessions() {
    let mut editor = editor();
    assert!(editor.prepare_for_modal().is_none());
    let cube = editor.add_mesh("cube", cube_spec(0.0)).unwrap();
    editor.select(Some(cube));
    editor.enter_edit_mode(sced_engine::editor::EditSubmode::Face).unwrap();
    assert!(editor.prepare_for_modal().is_some());
    assert!(editor.edit_mode().is_none());
    assert!(editor.active_tool().is_none());
}
