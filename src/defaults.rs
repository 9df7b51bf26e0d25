//! Default configuration values: timeouts, endpoints and API versions.

use std::time::Duration;

pub mod http {
    use super::*;

    /// Large models can take tens of seconds before the first byte.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
    pub const USER_AGENT: &str = concat!("kernel-connectors/", env!("CARGO_PKG_VERSION"));
}

pub mod openai {
    pub const BASE_URL: &str = "https://api.openai.com/v1";
    pub const CHAT_MODEL: &str = "gpt-4o-mini";
    pub const IMAGE_MODEL: &str = "dall-e-3";
    pub const TTS_MODEL: &str = "tts-1";
    pub const TTS_VOICE: &str = "alloy";
}

pub mod azure {
    pub const API_VERSION: &str = "2024-06-01";
}

pub mod mistral {
    pub const BASE_URL: &str = "https://api.mistral.ai/v1";
    pub const CHAT_MODEL: &str = "mistral-small-latest";
}

pub mod doubao {
    pub const BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";
}

pub mod anthropic {
    pub const BASE_URL: &str = "https://api.anthropic.com";
    pub const API_VERSION: &str = "2023-06-01";
    pub const CHAT_MODEL: &str = "claude-3-5-sonnet-latest";
    /// The Messages API requires `max_tokens`.
    pub const MAX_TOKENS: u32 = 4096;
}

pub mod gemini {
    pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    pub const CHAT_MODEL: &str = "gemini-1.5-flash";
}

pub mod dashscope {
    pub const BASE_URL: &str = "https://dashscope.aliyuncs.com/api/v1";
    pub const CHAT_MODEL: &str = "qwen-max";
}

pub mod hunyuan {
    pub const HOST: &str = "hunyuan.tencentcloudapi.com";
    pub const VERSION: &str = "2023-09-01";
    pub const ACTION: &str = "ChatCompletions";
    pub const CHAT_MODEL: &str = "hunyuan-lite";
}

pub mod qianfan {
    pub const BASE_URL: &str = "https://aip.baidubce.com";
    pub const TOKEN_PATH: &str = "/oauth/2.0/token";
    pub const CHAT_PATH: &str = "/rpc/2.0/ai_custom/v1/wenxinworkshop/chat";
    /// QianFan addresses models by endpoint name.
    pub const CHAT_MODEL: &str = "completions";
}

pub mod sparkdesk {
    pub const WS_URL: &str = "wss://spark-api.xf-yun.com/v3.5/chat";
    pub const DOMAIN: &str = "generalv3.5";
}

pub mod tencent_translate {
    pub const HOST: &str = "tmt.tencentcloudapi.com";
    pub const VERSION: &str = "2018-03-21";
    pub const ACTION: &str = "TextTranslateBatch";
    pub const REGION: &str = "ap-guangzhou";
}

pub mod volcano_translate {
    pub const HOST: &str = "translate.volcengineapi.com";
    pub const VERSION: &str = "2020-06-01";
    pub const ACTION: &str = "TranslateText";
    pub const REGION: &str = "cn-north-1";
    pub const SERVICE: &str = "translate";
}

pub mod youdao {
    pub const BASE_URL: &str = "https://openapi.youdao.com";
}
