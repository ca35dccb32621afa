// Symphonia
// Copyright (c) 2019-2022 The Project Symphonia Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed decibel quantization tables shared by the floor encoder and decoder.

/// The number of levels of the internal dB scale the encoder fits curves on.
pub const FLOOR1_DB_LEVELS: i32 = 1024;

/// Maps the upper mantissa bits of `level - 256.0`, for levels in the 140 dB range below full
/// scale, to a code on the 1024 level dB scale.
#[rustfmt::skip]
const FLOOR1_TO_DB_TABLE: [u16; 560] = [
    1023, 1021, 1019, 1018, 1016, 1014, 1012, 1010, 1008, 1007,
    1005, 1003, 1001,  999,  997,  996,  994,  992,  990,  988,
     986,  985,  983,  981,  979,  977,  975,  974,  972,  970,
     968,  966,  964,  963,  961,  959,  957,  955,  954,  952,
     950,  948,  946,  944,  943,  941,  939,  937,  935,  933,
     932,  930,  928,  926,  924,  922,  921,  919,  917,  915,
     913,  911,  910,  908,  906,  904,  902,  900,  899,  897,
     895,  893,  891,  890,  888,  886,  884,  882,  880,  879,
     877,  875,  873,  871,  869,  868,  866,  864,  862,  860,
     858,  857,  855,  853,  851,  849,  847,  846,  844,  842,
     840,  838,  836,  835,  833,  831,  829,  827,  826,  824,
     822,  820,  818,  816,  815,  813,  811,  809,  807,  805,
     804,  802,  800,  798,  796,  794,  793,  791,  789,  787,
     785,  783,  782,  780,  778,  776,  774,  772,  771,  769,
     767,  765,  763,  762,  760,  758,  756,  754,  752,  751,
     749,  747,  745,  743,  741,  740,  738,  736,  734,  732,
     730,  729,  727,  725,  723,  721,  719,  718,  716,  714,
     712,  710,  708,  707,  705,  703,  701,  699,  698,  696,
     694,  692,  690,  688,  687,  685,  683,  681,  679,  677,
     676,  674,  672,  670,  668,  666,  665,  663,  661,  659,
     657,  655,  654,  652,  650,  648,  646,  644,  643,  641,
     639,  637,  635,  634,  632,  630,  628,  626,  624,  623,
     621,  619,  617,  615,  613,  612,  610,  608,  606,  604,
     602,  601,  599,  597,  595,  593,  591,  590,  588,  586,
     584,  582,  580,  579,  577,  575,  573,  571,  570,  568,
     566,  564,  562,  560,  559,  557,  555,  553,  551,  549,
     548,  546,  544,  542,  540,  538,  537,  535,  533,  531,
     529,  527,  526,  524,  522,  520,  518,  516,  515,  513,
     511,  509,  507,  506,  504,  502,  500,  498,  496,  495,
     493,  491,  489,  487,  485,  484,  482,  480,  478,  476,
     474,  473,  471,  469,  467,  465,  463,  462,  460,  458,
     456,  454,  452,  451,  449,  447,  445,  443,  442,  440,
     438,  436,  434,  432,  431,  429,  427,  425,  423,  421,
     420,  418,  416,  414,  412,  410,  409,  407,  405,  403,
     401,  399,  398,  396,  394,  392,  390,  388,  387,  385,
     383,  381,  379,  378,  376,  374,  372,  370,  368,  367,
     365,  363,  361,  359,  357,  356,  354,  352,  350,  348,
     346,  345,  343,  341,  339,  337,  335,  334,  332,  330,
     328,  326,  324,  323,  321,  319,  317,  315,  314,  312,
     310,  308,  306,  304,  303,  301,  299,  297,  295,  293,
     292,  290,  288,  286,  284,  282,  281,  279,  277,  275,
     273,  271,  270,  268,  266,  264,  262,  260,  259,  257,
     255,  253,  251,  250,  248,  246,  244,  242,  240,  239,
     237,  235,  233,  231,  229,  228,  226,  224,  222,  220,
     218,  217,  215,  213,  211,  209,  207,  206,  204,  202,
     200,  198,  196,  195,  193,  191,  189,  187,  186,  184,
     182,  180,  178,  176,  175,  173,  171,  169,  167,  165,
     164,  162,  160,  158,  156,  154,  153,  151,  149,  147,
     145,  143,  142,  140,  138,  136,  134,  132,  131,  129,
     127,  125,  123,  122,  120,  118,  116,  114,  112,  111,
     109,  107,  105,  103,  101,  100,   98,   96,   94,   92,
      90,   89,   87,   85,   83,   81,   79,   78,   76,   74,
      72,   70,   68,   67,   65,   63,   61,   59,   58,   56,
      54,   52,   50,   48,   47,   45,   43,   41,   39,   37,
      36,   34,   32,   30,   28,   26,   25,   23,   21,   19,
      17,   15,   14,   12,   10,    8,    6,    4,    3,    1,
];

/// As defined in section 10.1 of the Vorbis I specification.
#[allow(clippy::unreadable_literal)]
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
pub(crate) const FLOOR1_INVERSE_DB_TABLE: [f32; 256] = [
    1.0649863e-07, 1.1341951e-07, 1.2079015e-07, 1.2863978e-07,
    1.3699951e-07, 1.4590251e-07, 1.5538408e-07, 1.6548181e-07,
    1.7623575e-07, 1.8768855e-07, 1.9988561e-07, 2.1287530e-07,
    2.2670913e-07, 2.4144197e-07, 2.5713223e-07, 2.7384213e-07,
    2.9163793e-07, 3.1059021e-07, 3.3077411e-07, 3.5226968e-07,
    3.7516214e-07, 3.9954229e-07, 4.2550680e-07, 4.5315863e-07,
    4.8260743e-07, 5.1396998e-07, 5.4737065e-07, 5.8294187e-07,
    6.2082472e-07, 6.6116941e-07, 7.0413592e-07, 7.4989464e-07,
    7.9862701e-07, 8.5052630e-07, 9.0579828e-07, 9.6466216e-07,
    1.0273513e-06, 1.0941144e-06, 1.1652161e-06, 1.2409384e-06,
    1.3215816e-06, 1.4074654e-06, 1.4989305e-06, 1.5963394e-06,
    1.7000785e-06, 1.8105592e-06, 1.9282195e-06, 2.0535261e-06,
    2.1869758e-06, 2.3290978e-06, 2.4804557e-06, 2.6416497e-06,
    2.8133190e-06, 2.9961443e-06, 3.1908506e-06, 3.3982101e-06,
    3.6190449e-06, 3.8542308e-06, 4.1047004e-06, 4.3714470e-06,
    4.6555282e-06, 4.9580707e-06, 5.2802740e-06, 5.6234160e-06,
    5.9888572e-06, 6.3780469e-06, 6.7925283e-06, 7.2339451e-06,
    7.7040476e-06, 8.2047000e-06, 8.7378876e-06, 9.3057248e-06,
    9.9104632e-06, 1.0554501e-05, 1.1240392e-05, 1.1970856e-05,
    1.2748789e-05, 1.3577278e-05, 1.4459606e-05, 1.5399272e-05,
    1.6400004e-05, 1.7465768e-05, 1.8600792e-05, 1.9809576e-05,
    2.1096914e-05, 2.2467911e-05, 2.3928002e-05, 2.5482978e-05,
    2.7139006e-05, 2.8902651e-05, 3.0780908e-05, 3.2781225e-05,
    3.4911534e-05, 3.7180282e-05, 3.9596466e-05, 4.2169667e-05,
    4.4910090e-05, 4.7828601e-05, 5.0936773e-05, 5.4246931e-05,
    5.7772202e-05, 6.1526565e-05, 6.5524908e-05, 6.9783085e-05,
    7.4317983e-05, 7.9147585e-05, 8.4291040e-05, 8.9768747e-05,
    9.5602426e-05, 0.00010181521, 0.00010843174, 0.00011547824,
    0.00012298267, 0.00013097477, 0.00013948625, 0.00014855085,
    0.00015820453, 0.00016848555, 0.00017943469, 0.00019109536,
    0.00020351382, 0.00021673929, 0.00023082423, 0.00024582449,
    0.00026179955, 0.00027881276, 0.00029693158, 0.00031622787,
    0.00033677814, 0.00035866388, 0.00038197188, 0.00040679456,
    0.00043323036, 0.00046138411, 0.00049136745, 0.00052329927,
    0.00055730621, 0.00059352311, 0.00063209358, 0.00067317058,
    0.00071691700, 0.00076350630, 0.00081312324, 0.00086596457,
    0.00092223983, 0.00098217216, 0.0010459992,  0.0011139742,
    0.0011863665,  0.0012634633,  0.0013455702,  0.0014330129,
    0.0015261382,  0.0016253153,  0.0017309374,  0.0018434235,
    0.0019632195,  0.0020908006,  0.0022266726,  0.0023713743,
    0.0025254795,  0.0026895994,  0.0028643847,  0.0030505286,
    0.0032487691,  0.0034598925,  0.0036847358,  0.0039241906,
    0.0041792066,  0.0044507950,  0.0047400328,  0.0050480668,
    0.0053761186,  0.0057254891,  0.0060975636,  0.0064938176,
    0.0069158225,  0.0073652516,  0.0078438871,  0.0083536271,
    0.0088964928,  0.009474637,   0.010090352,   0.010746080,
    0.011444421,   0.012188144,   0.012980198,   0.013823725,
    0.014722068,   0.015678791,   0.016697687,   0.017782797,
    0.018938423,   0.020169149,   0.021479854,   0.022875735,
    0.024362330,   0.025945531,   0.027631618,   0.029427276,
    0.031339626,   0.033376252,   0.035545228,   0.037855157,
    0.040315199,   0.042935108,   0.045725273,   0.048696758,
    0.051861348,   0.055231591,   0.058820850,   0.062643361,
    0.066714279,   0.071049749,   0.075666962,   0.080584227,
    0.085821044,   0.091398179,   0.097337747,   0.10366330,
    0.11039993,    0.11757434,    0.12521498,    0.13335215,
    0.14201813,    0.15124727,    0.16107617,    0.17154380,
    0.18269168,    0.19456402,    0.20720788,    0.22067342,
    0.23501402,    0.25028656,    0.26655159,    0.28387361,
    0.30232132,    0.32196786,    0.34289114,    0.36517414,
    0.38890521,    0.41417847,    0.44109412,    0.46975890,
    0.50028648,    0.53279791,    0.56742212,    0.60429640,
    0.64356699,    0.68538959,    0.72993007,    0.77736504,
    0.82788260,    0.88168307,    0.9389798,     1.0,
];

/// Bit pattern of `-256.0f32`, the offset level of a 0 dB input.
const DB_QUANT_FULL_SCALE: u32 = 0xc380_0000;

/// Bit pattern of `-395.75f32`, the offset level of the quietest non-silent input.
const DB_QUANT_SILENCE: u32 = 0xc3c5_e000;

/// Quantize a level in decibels (0 dB is full scale) to the 1024 level dB scale.
///
/// The quantizer works on the IEEE-754 bit pattern of `db - 256.0` so that every platform produces
/// identical codes. Levels at or above 0 dB saturate to 1023, levels below roughly -139.75 dB are
/// silent and return 0.
#[inline]
pub fn db_quantize(db: f32) -> u16 {
    let bits = (db - 256.0).to_bits();

    if bits < DB_QUANT_FULL_SCALE {
        1023
    }
    else if bits > DB_QUANT_SILENCE {
        0
    }
    else {
        FLOOR1_TO_DB_TABLE[((bits - DB_QUANT_FULL_SCALE) >> 13) as usize]
    }
}

/// Quantize a linear magnitude to the 1024 level dB scale.
///
/// Magnitudes that are zero, negative, or not a number are silent.
#[inline]
pub fn magnitude_to_db_code(x: f32) -> u16 {
    if x > 0.0 {
        db_quantize(20.0 * x.log10())
    }
    else {
        0
    }
}

/// Convert a code on the 256 level dB scale back to a linear magnitude.
///
/// Panics if `y` is outside `0..256`.
#[inline(always)]
pub fn inverse_db(y: i32) -> f32 {
    FLOOR1_INVERSE_DB_TABLE[y as usize]
}
