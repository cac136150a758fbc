use adb_bridge::prelude::*;

fn main() -> ADBResult<()> {
    env_logger::init();

    // 创建配置：使用 PATH 中的 adb，不提权
    let config = ADBConfigBuilder::default()
        .path("adb")
        .elevation(ElevationMode::None)
        .build();

    let adb = ADB::new(Some(config));

    // 重启 ADB 服务器，守护进程未运行时忽略拒绝连接
    match adb.kill_server() {
        Ok(()) | Err(ADBError::ConnectionRefused) => {}
        Err(e) => return Err(e),
    }
    adb.start_server()?;

    let state = adb.state();
    println!("设备状态: {}", state);

    if !adb.is_ready() {
        println!("设备尚未就绪");
        return Ok(());
    }

    let props = adb.get_prop_map()?;
    println!("  型号: {}", props.model());
    println!("  品牌: {}", props.brand());
    println!("  代号: {}", props.codename());
    println!("  序列号: {}", props.serial_number());
    println!("  Android 版本: {}", props.android_version());
    println!("  CPU 架构: {}", props.cpu_arch()?);
    println!("  A/B 分区: {}", props.is_ab());
    println!("  第三方 ROM: {}", props.is_custom_rom());

    match adb.imei() {
        Ok(imei) => println!("  IMEI: {}", imei),
        Err(e) => println!("  IMEI 不可用: {}", e),
    }

    Ok(())
}
