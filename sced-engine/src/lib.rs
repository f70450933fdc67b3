pub mod action;
pub mod backend;
pub mod command;
pub mod editor;
pub mod interaction;
pub mod memory;
pub mod registry;
pub mod tools;

pub mod errors {
    use sced_core::object::SceneObjectRef;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("object {0} not found")]
        ObjectNotFound(SceneObjectRef),
        #[error("no object named `{0}`")]
        UnknownName(String),
        #[error("object {0} is not a mesh")]
        NotAMesh(SceneObjectRef),
        #[error("object {0} is not a light")]
        NotALight(SceneObjectRef),
        #[error("nothing is selected")]
        NothingSelected,
        #[error(transparent)]
        Tool(#[from] ToolError),
    }

    /// 工具启动失败的原因；交互过程中的问题不会走这里。
    #[derive(Debug, Error)]
    pub enum ToolError {
        #[error("object {0} has no editable mesh geometry")]
        NoEditableMesh(SceneObjectRef),
        #[error("mesh {0} has no polygonal faces")]
        NoPolygons(SceneObjectRef),
        #[error("transform of {0} is not invertible")]
        SingularTransform(SceneObjectRef),
    }
}
