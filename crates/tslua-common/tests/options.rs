use super::*;

#[test]
fn test_options_deserialize_from_camel_case() {
    let options: CompilerOptions = serde_json::from_str(
        r#"{
            "luaTarget": "5.1",
            "luaLibImport": "require-minimal",
            "inlineSourceMap": true,
            "sourceRoot": "src\\"
        }"#,
    )
    .expect("parse options");

    assert_eq!(options.lua_target, LuaTarget::Lua51);
    assert_eq!(options.lua_lib_import, LuaLibImportKind::RequireMinimal);
    assert!(options.inline_source_map);
    assert!(!options.source_map);
    assert_eq!(options.normalized_source_root(), "src/");
}

#[test]
fn test_default_options() {
    let options = CompilerOptions::default();
    assert_eq!(options.lua_target, LuaTarget::Universal);
    assert_eq!(options.lua_lib_import, LuaLibImportKind::Require);
    assert_eq!(options.normalized_source_root(), "");
}

#[test]
fn test_target_capabilities() {
    assert!(!LuaTarget::Universal.supports_goto());
    assert!(!LuaTarget::Lua51.supports_goto());
    assert!(LuaTarget::Lua52.supports_goto());
    assert!(LuaTarget::LuaJit.supports_goto());
    assert!(LuaTarget::LuaJit.has_global_unpack());
    assert!(!LuaTarget::Lua53.has_global_unpack());
    assert_eq!(LuaTarget::LuaJit.to_string(), "JIT");
}
