use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 共享产物读写错误
    #[error("持久化错误: {0}")]
    Persist(#[from] PersistError),
    /// 目录数据错误
    #[error("目录错误: {0}")]
    Catalog(#[from] CatalogError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 浏览器相关错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {reason}")]
    ConfigurationFailed { reason: String },
    /// 启动浏览器失败
    #[error("启动无头浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 创建页面失败
    #[error("创建页面失败: {source}")]
    PageCreationFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 执行脚本失败
    #[error("执行脚本失败: {source}")]
    ScriptExecutionFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 关闭浏览器失败
    #[error("关闭浏览器失败: {source}")]
    CloseFailed {
        #[source]
        source: chromiumoxide::error::CdpError,
    },
    /// 脚本返回值无法解析
    #[error("脚本返回值解析失败: {source}")]
    ScriptResultInvalid {
        #[source]
        source: serde_json::Error,
    },
}

/// 共享产物（表格 / JSON / 跳过日志）读写错误
#[derive(Debug, Error)]
pub enum PersistError {
    /// 获取文件锁失败
    #[error("获取文件锁失败 ({path}): {source}")]
    LockFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// CSV 读写失败
    #[error("CSV 处理失败 ({path}): {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    /// JSON 读写失败
    #[error("JSON 处理失败 ({path}): {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// JSON 镜像不是对象数组
    #[error("JSON 镜像格式错误 ({path}): 顶层必须是对象数组")]
    MalformedMirror { path: String },
}

/// 目录数据错误
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 读取目录文件失败
    #[error("读取目录文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 解析目录文件失败
    #[error("解析目录文件失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 存在缺少必填字段的记录，整批拒绝
    #[error("目录中有 {} 条记录缺少必填字段 (索引: {:?})，整批拒绝", .indexes.len(), .indexes)]
    Rejected { indexes: Vec<usize> },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 选择器文件无法加载
    #[error("选择器文件加载失败 ({path}): {reason}")]
    SelectorsInvalid { path: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl PersistError {
    pub fn read(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        PersistError::ReadFailed {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn write(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        PersistError::WriteFailed {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn csv(path: impl AsRef<std::path::Path>, source: csv::Error) -> Self {
        PersistError::Csv {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn json(path: impl AsRef<std::path::Path>, source: serde_json::Error) -> Self {
        PersistError::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 持久化层结果类型
pub type PersistResult<T> = Result<T, PersistError>;
