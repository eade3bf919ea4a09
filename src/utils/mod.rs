// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 编排层错误类型与日志初始化
pub mod errors;
pub mod telemetry;
