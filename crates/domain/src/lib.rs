//! 后台管理系统核心领域模型
//!
//! 包含收银台、客户、供应商、班级、财务流水、课表等实体，
//! 以及仓储接口和基于角色的路由访问控制。

pub mod access;
pub mod entities;
pub mod errors;
pub mod repositories;
pub mod value_objects;

// 重新导出常用类型
pub use access::*;
pub use entities::*;
pub use errors::*;
pub use repositories::*;
pub use value_objects::*;
