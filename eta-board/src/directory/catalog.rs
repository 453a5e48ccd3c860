//! Static heavy-rail and light-rail definitions.

use crate::domain::{RailDirection, StationCode};

/// A heavy-rail line with its stations in UP order.
#[derive(Debug)]
pub struct RailLine {
    pub code: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub up_terminal: &'static str,
    pub down_terminal: &'static str,
    /// `(code, name)` pairs.
    pub stations: &'static [(&'static str, &'static str)],
}

impl RailLine {
    /// Terminal label shown for a direction.
    pub fn terminal(&self, dir: RailDirection) -> &'static str {
        match dir {
            RailDirection::Up => self.up_terminal,
            RailDirection::Down => self.down_terminal,
        }
    }

    /// Station codes in UP order.
    pub fn station_codes(&self) -> Vec<StationCode> {
        self.stations
            .iter()
            .filter_map(|(code, _)| StationCode::parse(code).ok())
            .collect()
    }

    /// Name of a station on this line.
    pub fn station_name(&self, code: &str) -> Option<&'static str> {
        self.stations
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, name)| *name)
    }
}

/// A light-rail route with its stops in DOWN order.
#[derive(Debug)]
pub struct LightRailRoute {
    pub route: &'static str,
    pub dest_up: &'static str,
    pub dest_down: &'static str,
    pub stations: &'static [u32],
}

impl LightRailRoute {
    /// Circular routes run one way only and are always shown as UP.
    pub fn is_circular(&self) -> bool {
        crate::upstream::is_circular(self.route)
    }

    /// The direction actually displayed for `dir`.
    pub fn shown_dir(&self, dir: RailDirection) -> RailDirection {
        if self.is_circular() { RailDirection::Up } else { dir }
    }

    /// Destination name for a direction, as the upstream spells it.
    pub fn dest(&self, dir: RailDirection) -> &'static str {
        match dir {
            RailDirection::Up => self.dest_up,
            RailDirection::Down => self.dest_down,
        }
    }
}

/// Light-rail brand colour.
pub const LIGHT_RAIL_COLOR: &str = "#D3A809";

pub static RAIL_LINES: &[RailLine] = &[
    RailLine {
        code: "AEL",
        name: "機場快綫",
        color: "#00888A",
        up_terminal: "博覽館",
        down_terminal: "香港",
        stations: &[
            ("HOK", "香港"),
            ("KOW", "九龍"),
            ("TSY", "青衣"),
            ("AIR", "機場"),
            ("AWE", "博覽館"),
        ],
    },
    RailLine {
        code: "TCL",
        name: "東涌綫",
        color: "#F7943E",
        up_terminal: "東涌",
        down_terminal: "香港",
        stations: &[
            ("HOK", "香港"),
            ("KOW", "九龍"),
            ("OLY", "奧運"),
            ("NAC", "南昌"),
            ("LAK", "荔景"),
            ("TSY", "青衣"),
            ("SUN", "欣澳"),
            ("TUC", "東涌"),
        ],
    },
    RailLine {
        code: "TML",
        name: "屯馬綫",
        color: "#923011",
        up_terminal: "屯門",
        down_terminal: "烏溪沙",
        stations: &[
            ("WKS", "烏溪沙"),
            ("MOS", "馬鞍山"),
            ("HEO", "恆安"),
            ("TSH", "大水坑"),
            ("SHM", "石門"),
            ("CIO", "第一城"),
            ("STW", "沙田圍"),
            ("CKT", "車公廟"),
            ("TAW", "大圍"),
            ("HIK", "顯徑"),
            ("DIH", "鑽石山"),
            ("KAT", "啟德"),
            ("SUW", "宋皇臺"),
            ("TKW", "土瓜灣"),
            ("HOM", "何文田"),
            ("HUH", "紅磡"),
            ("ETS", "尖東"),
            ("AUS", "柯士甸"),
            ("NAC", "南昌"),
            ("MEF", "美孚"),
            ("TWW", "荃灣西"),
            ("KSR", "錦上路"),
            ("YUL", "元朗"),
            ("LOP", "朗屏"),
            ("TIS", "天水圍"),
            ("SIH", "兆康"),
            ("TUM", "屯門"),
        ],
    },
    RailLine {
        code: "TKL",
        name: "將軍澳綫",
        color: "#7D499D",
        up_terminal: "寶琳/康城",
        down_terminal: "北角",
        stations: &[
            ("NOP", "北角"),
            ("QUB", "鰂魚涌"),
            ("YAT", "油塘"),
            ("TIK", "調景嶺"),
            ("TKO", "將軍澳"),
            ("LHP", "康城"),
            ("HAH", "坑口"),
            ("POA", "寶琳"),
        ],
    },
    RailLine {
        code: "EAL",
        name: "東鐵綫",
        color: "#5EB6E4",
        up_terminal: "羅湖/落馬洲",
        down_terminal: "金鐘",
        stations: &[
            ("ADM", "金鐘"),
            ("EXC", "會展"),
            ("HUH", "紅磡"),
            ("MKK", "旺角東"),
            ("KOT", "九龍塘"),
            ("TAW", "大圍"),
            ("SHT", "沙田"),
            ("FOT", "火炭"),
            ("RAC", "馬場"),
            ("UNI", "大學"),
            ("TAP", "大埔墟"),
            ("TWO", "太和"),
            ("FAN", "粉嶺"),
            ("SHS", "上水"),
            ("LOW", "羅湖"),
            ("LMC", "落馬洲"),
        ],
    },
    RailLine {
        code: "SIL",
        name: "南港島綫",
        color: "#CBD300",
        up_terminal: "海怡半島",
        down_terminal: "金鐘",
        stations: &[
            ("ADM", "金鐘"),
            ("OCP", "海洋公園"),
            ("WCH", "黃竹坑"),
            ("LET", "利東"),
            ("SOH", "海怡半島"),
        ],
    },
    RailLine {
        code: "TWL",
        name: "荃灣綫",
        color: "#E2231A",
        up_terminal: "荃灣",
        down_terminal: "中環",
        stations: &[
            ("CEN", "中環"),
            ("ADM", "金鐘"),
            ("TST", "尖沙咀"),
            ("JOR", "佐敦"),
            ("YMT", "油麻地"),
            ("MOK", "旺角"),
            ("PRE", "太子"),
            ("SSP", "深水埗"),
            ("CSW", "長沙灣"),
            ("LCK", "荔枝角"),
            ("MEF", "美孚"),
            ("LAK", "荔景"),
            ("KWF", "葵芳"),
            ("KWH", "葵興"),
            ("TWH", "大窩口"),
            ("TSW", "荃灣"),
        ],
    },
    RailLine {
        code: "ISL",
        name: "港島綫",
        color: "#0860A8",
        up_terminal: "柴灣",
        down_terminal: "堅尼地城",
        stations: &[
            ("KET", "堅尼地城"),
            ("HKU", "香港大學"),
            ("SYP", "西營盤"),
            ("SHW", "上環"),
            ("CEN", "中環"),
            ("ADM", "金鐘"),
            ("WAC", "灣仔"),
            ("CAB", "銅鑼灣"),
            ("TIH", "天后"),
            ("FOH", "炮台山"),
            ("NOP", "北角"),
            ("QUB", "鰂魚涌"),
            ("TAK", "太古"),
            ("SWH", "西灣河"),
            ("SKW", "筲箕灣"),
            ("HFC", "杏花邨"),
            ("CHW", "柴灣"),
        ],
    },
    RailLine {
        code: "KTL",
        name: "觀塘綫",
        color: "#00AB4E",
        up_terminal: "調景嶺",
        down_terminal: "黃埔",
        stations: &[
            ("WHA", "黃埔"),
            ("HOM", "何文田"),
            ("YMT", "油麻地"),
            ("MOK", "旺角"),
            ("PRE", "太子"),
            ("SKM", "石硤尾"),
            ("KOT", "九龍塘"),
            ("LOF", "樂富"),
            ("WTS", "黃大仙"),
            ("DIH", "鑽石山"),
            ("CHH", "彩虹"),
            ("KOB", "九龍灣"),
            ("NTK", "牛頭角"),
            ("KWT", "觀塘"),
            ("LAT", "藍田"),
            ("YAT", "油塘"),
            ("TIK", "調景嶺"),
        ],
    },
    RailLine {
        code: "DRL",
        name: "迪士尼綫",
        color: "#F173AC",
        up_terminal: "迪士尼",
        down_terminal: "欣澳",
        stations: &[("SUN", "欣澳"), ("DIS", "迪士尼")],
    },
];

pub static LIGHT_RAIL_ROUTES: &[LightRailRoute] = &[
    LightRailRoute {
        route: "505",
        dest_up: "三聖",
        dest_down: "兆康",
        stations: &[1, 10, 15, 20, 30, 40, 50, 60, 70, 80, 90, 100],
    },
    LightRailRoute {
        route: "705",
        dest_up: "天水圍循環綫",
        dest_down: "天水圍循環綫",
        stations: &[430, 435, 445, 448, 450, 455, 460, 468, 480, 490, 500, 510, 520, 530],
    },
    LightRailRoute {
        route: "706",
        dest_up: "天水圍循環綫",
        dest_down: "天水圍循環綫",
        stations: &[530, 520, 510, 500, 490, 480, 468, 460, 455, 450, 448, 445, 435, 430],
    },
    LightRailRoute {
        route: "751",
        dest_up: "友愛",
        dest_down: "天逸",
        stations: &[530, 520, 510, 500, 490, 480, 468, 460, 455, 450, 448, 445, 435, 430],
    },
];

static LIGHT_RAIL_STATIONS: &[(u32, &str)] = &[
    (1, "屯門碼頭"),
    (10, "美樂"),
    (15, "蝴蝶"),
    (20, "輕鐵車廠"),
    (30, "龍門"),
    (40, "青山村"),
    (50, "青雲"),
    (60, "建安"),
    (70, "河田"),
    (80, "澤豐"),
    (90, "屯門醫院"),
    (100, "兆康"),
    (430, "天水圍"),
    (435, "天慈"),
    (445, "胡屋"),
    (448, "樂湖"),
    (450, "天湖"),
    (455, "銀座"),
    (460, "天瑞"),
    (468, "頌富"),
    (480, "天富"),
    (490, "翠湖"),
    (500, "天榮"),
    (510, "天悅"),
    (520, "天秀"),
    (530, "天逸"),
];

/// Heavy-rail line by code.
pub fn rail_line(code: &str) -> Option<&'static RailLine> {
    RAIL_LINES.iter().find(|line| line.code == code)
}

/// Heavy-rail station name by code, from the first line listing it.
pub fn station_name(code: &str) -> Option<&'static str> {
    RAIL_LINES.iter().find_map(|line| line.station_name(code))
}

/// Light-rail route by number.
pub fn light_rail_route(route: &str) -> Option<&'static LightRailRoute> {
    LIGHT_RAIL_ROUTES.iter().find(|r| r.route == route)
}

/// Light-rail stop name by id.
pub fn light_rail_station_name(id: u32) -> Option<&'static str> {
    LIGHT_RAIL_STATIONS
        .iter()
        .find(|(sid, _)| *sid == id)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_station_code_is_valid() {
        for line in RAIL_LINES {
            assert_eq!(
                line.station_codes().len(),
                line.stations.len(),
                "bad code on {}",
                line.code
            );
        }
    }

    #[test]
    fn every_light_rail_stop_is_named() {
        for route in LIGHT_RAIL_ROUTES {
            for id in route.stations {
                assert!(light_rail_station_name(*id).is_some(), "stop {id}");
            }
        }
    }

    #[test]
    fn lookups() {
        let tkl = rail_line("TKL").unwrap();
        assert_eq!(tkl.terminal(RailDirection::Up), "寶琳/康城");
        assert_eq!(tkl.station_name("POA"), Some("寶琳"));
        assert_eq!(station_name("ADM"), Some("金鐘"));
        assert!(rail_line("XXX").is_none());
        assert_eq!(light_rail_route("751").unwrap().dest(RailDirection::Down), "天逸");
    }
}
